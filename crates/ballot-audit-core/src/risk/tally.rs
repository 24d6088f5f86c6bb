//! Mergeable per-worker trial counters.

use std::collections::BTreeMap;

use crate::simulate::TrialOutcome;
use crate::types::{CandidateId, ReportedOutcome, WinnerOrder, WinnerSet};

/// How often one winner set came up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeCount {
    /// Trials producing this set.
    pub count: u64,
    /// Lowest trial index that produced it.
    pub first_trial: u64,
    /// Election order in that trial.
    pub exemplar: WinnerOrder,
}

/// Match / mismatch / discard counters plus outcome diagnostics.
///
/// Partial tallies from different workers merge into the same result in any
/// order.
#[derive(Debug, Clone, Default)]
pub struct TrialTally {
    /// Trials whose winner set equals the reported one.
    pub matches: u64,
    /// Completed trials with a different winner set.
    pub mismatches: u64,
    /// Trials the engine rejected.
    pub discarded: u64,
    /// Oracle resolutions used across all completed trials.
    pub ties_resolved: u64,
    /// Winner sets seen.
    pub outcomes: BTreeMap<WinnerSet, OutcomeCount>,
    /// Completed trials in which each candidate was elected.
    pub candidate_wins: BTreeMap<CandidateId, u64>,
    /// Lowest trial index in which each candidate was elected. Together with
    /// the round seed this regenerates a population electing them.
    pub first_win: BTreeMap<CandidateId, u64>,
    /// Discards bucketed by [`crate::CountError::kind`].
    pub discard_reasons: BTreeMap<&'static str, u64>,
    pub(crate) cancelled: bool,
}

impl TrialTally {
    /// Record one trial.
    pub fn record(&mut self, trial: u64, outcome: TrialOutcome, reported: &ReportedOutcome) {
        match outcome {
            TrialOutcome::Completed {
                winners,
                ties_resolved,
            } => {
                let set = winners.to_set();
                if reported.matches(&set) {
                    self.matches += 1;
                } else {
                    self.mismatches += 1;
                }
                self.ties_resolved += ties_resolved as u64;
                for &c in &set.0 {
                    *self.candidate_wins.entry(c).or_insert(0) += 1;
                    self.first_win
                        .entry(c)
                        .and_modify(|t| *t = (*t).min(trial))
                        .or_insert(trial);
                }
                self.outcomes
                    .entry(set)
                    .and_modify(|o| {
                        o.count += 1;
                        if trial < o.first_trial {
                            o.first_trial = trial;
                            o.exemplar = winners.clone();
                        }
                    })
                    .or_insert_with(|| OutcomeCount {
                        count: 1,
                        first_trial: trial,
                        exemplar: winners.clone(),
                    });
            }
            TrialOutcome::Discarded(error) => {
                self.discarded += 1;
                *self.discard_reasons.entry(error.kind()).or_insert(0) += 1;
            }
        }
    }

    /// Fold another partial tally into this one.
    pub fn merge(&mut self, other: TrialTally) {
        self.matches += other.matches;
        self.mismatches += other.mismatches;
        self.discarded += other.discarded;
        self.ties_resolved += other.ties_resolved;
        self.cancelled |= other.cancelled;
        for (set, theirs) in other.outcomes {
            match self.outcomes.get_mut(&set) {
                Some(ours) => {
                    ours.count += theirs.count;
                    if theirs.first_trial < ours.first_trial {
                        ours.first_trial = theirs.first_trial;
                        ours.exemplar = theirs.exemplar;
                    }
                }
                None => {
                    self.outcomes.insert(set, theirs);
                }
            }
        }
        for (c, n) in other.candidate_wins {
            *self.candidate_wins.entry(c).or_insert(0) += n;
        }
        for (c, t) in other.first_win {
            self.first_win
                .entry(c)
                .and_modify(|ours| *ours = (*ours).min(t))
                .or_insert(t);
        }
        for (reason, n) in other.discard_reasons {
            *self.discard_reasons.entry(reason).or_insert(0) += n;
        }
    }

    /// Trials that produced an outcome.
    pub fn valid(&self) -> u64 {
        self.matches + self.mismatches
    }

    /// Trials recorded, valid or not.
    pub fn total(&self) -> u64 {
        self.valid() + self.discarded
    }

    /// Fraction of valid trials matching the reported outcome; 0 with no
    /// valid trials.
    pub fn p_hat(&self) -> f64 {
        match self.valid() {
            0 => 0.0,
            valid => self.matches as f64 / valid as f64,
        }
    }

    /// Most frequent winner set; ties go to the smaller set.
    pub fn most_common(&self) -> Option<(&WinnerSet, &OutcomeCount)> {
        self.outcomes
            .iter()
            .fold(None, |best: Option<(&WinnerSet, &OutcomeCount)>, (set, count)| match best {
                Some((_, b)) if b.count >= count.count => best,
                _ => Some((set, count)),
            })
    }
}
