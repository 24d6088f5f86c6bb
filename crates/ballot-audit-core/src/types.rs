//! Shared data model: candidates, rankings, ballots and outcomes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque candidate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CandidateId {
    fn from(id: u32) -> Self {
        CandidateId(id)
    }
}

/// A contest candidate: identifier plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier referenced by ballots.
    pub id: CandidateId,
    /// Human-readable name used in reports.
    pub name: String,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(id: impl Into<CandidateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The immutable, ordered candidate list of a contest.
///
/// Maps candidate ids to dense indices so counting engines can use plain
/// vectors for tallies.
#[derive(Debug, Clone)]
pub struct CandidateRoster {
    candidates: Vec<Candidate>,
    index: HashMap<CandidateId, usize>,
}

impl CandidateRoster {
    /// Build a roster. Returns the first duplicated id on failure.
    pub fn new(candidates: Vec<Candidate>) -> Result<Self, CandidateId> {
        let mut index = HashMap::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            if index.insert(candidate.id, i).is_some() {
                return Err(candidate.id);
            }
        }
        Ok(Self { candidates, index })
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True if the roster has no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates in roster order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Dense index of a candidate id.
    pub fn index_of(&self, id: CandidateId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// True if the id belongs to this roster.
    pub fn contains(&self, id: CandidateId) -> bool {
        self.index.contains_key(&id)
    }

    /// Candidate at a dense index.
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Display name for an id, falling back to the numeric id.
    pub fn name_of(&self, id: CandidateId) -> String {
        self.index_of(id)
            .map(|i| self.candidates[i].name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Candidate ids in roster order.
    pub fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.candidates.iter().map(|c| c.id)
    }
}

/// An ordered preference list, most preferred first.
///
/// May be shorter than the candidate list (a partial ranking) or empty
/// (an exhausted ballot). Legality against a roster is checked on admission
/// to the ballot pool, not on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking(Vec<CandidateId>);

impl Ranking {
    /// Create a ranking from preference-ordered ids.
    pub fn new(preferences: Vec<CandidateId>) -> Self {
        Ranking(preferences)
    }

    /// A ranking with a single first preference.
    pub fn singleton(id: CandidateId) -> Self {
        Ranking(vec![id])
    }

    /// Preferences as a slice.
    pub fn as_slice(&self) -> &[CandidateId] {
        &self.0
    }

    /// Number of ranked candidates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an exhausted (blank) ballot.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First preference, if any.
    pub fn first(&self) -> Option<CandidateId> {
        self.0.first().copied()
    }
}

impl From<Vec<u32>> for Ranking {
    fn from(ids: Vec<u32>) -> Self {
        Ranking(ids.into_iter().map(CandidateId).collect())
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}

/// Where a ballot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Physically retrieved and transcribed during the audit.
    Observed,
    /// Imputed by the posterior sampler for a single trial.
    UnobservedSimulated,
}

/// A transcribed or simulated ballot.
///
/// Observed ballots are only created by [`crate::BallotPool`] after
/// validation and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ballot {
    ranking: Ranking,
    provenance: Provenance,
    round: u32,
}

impl Ballot {
    pub(crate) fn observed(ranking: Ranking, round: u32) -> Self {
        Self {
            ranking,
            provenance: Provenance::Observed,
            round,
        }
    }

    pub(crate) fn simulated(ranking: Ranking, round: u32) -> Self {
        Self {
            ranking,
            provenance: Provenance::UnobservedSimulated,
            round,
        }
    }

    /// The preference list.
    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    /// Observed or simulated.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Audit round in which the ballot was admitted (simulated ballots carry
    /// the round of the trial that produced them).
    pub fn round(&self) -> u32 {
        self.round
    }
}

/// Winners in the order the count declared them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinnerOrder(pub Vec<CandidateId>);

impl WinnerOrder {
    /// Unordered view used for outcome comparison.
    pub fn to_set(&self) -> WinnerSet {
        WinnerSet(self.0.iter().copied().collect())
    }

    /// Number of winners.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nobody was elected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Winners as a set; two outcomes agree when their sets are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinnerSet(pub BTreeSet<CandidateId>);

impl WinnerSet {
    /// Winners in ascending id order.
    pub fn to_vec(&self) -> Vec<CandidateId> {
        self.0.iter().copied().collect()
    }

    /// True if the candidate is among the winners.
    pub fn contains(&self, id: CandidateId) -> bool {
        self.0.contains(&id)
    }
}

/// The officially declared outcome under test. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedOutcome {
    order: WinnerOrder,
    set: WinnerSet,
}

impl ReportedOutcome {
    /// Create from the declared winner ordering.
    pub fn new(winners: Vec<CandidateId>) -> Self {
        let order = WinnerOrder(winners);
        let set = order.to_set();
        Self { order, set }
    }

    /// Declared ordering, retained for reporting.
    pub fn order(&self) -> &WinnerOrder {
        &self.order
    }

    /// Declared winner set.
    pub fn winner_set(&self) -> &WinnerSet {
        &self.set
    }

    /// True if a simulated winner set equals the declared one.
    pub fn matches(&self, winners: &WinnerSet) -> bool {
        &self.set == winners
    }
}
