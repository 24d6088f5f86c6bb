//! Tie-break order derived from the jurisdiction's own tie resolutions.
//!
//! Recorded tie events become edges of a preference graph (`a → b` means `a`
//! is elected, or kept, ahead of `b`). A random topological sort of that
//! graph, seeded from the public tie-break ceremony, yields one total order
//! that every simulated count reuses.
//!
//! # Resolution rules
//!
//! - Election tie: the tied candidate earliest in the order is elected.
//! - Exclusion tie: the tied candidate latest in the order is excluded.
//! - Election-order tie: tied candidates are elected in order.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TieBreakError;
use crate::seed::hash_seed_string;
use crate::tabulation::TieSignal;
use crate::types::{CandidateId, CandidateRoster};

/// Which kind of decision a tie blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieKind {
    /// One of the tied candidates must be elected to the last seat.
    Election,
    /// One of the tied candidates must be excluded.
    Exclusion,
    /// All tied candidates are elected; their order must be fixed.
    ElectionOrder,
}

/// A tie resolution recorded in the official count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TieEvent {
    /// Tied candidates elected in the given order.
    ElectionOrder {
        /// Permutation chosen by the official.
        order: Vec<CandidateId>,
    },
    /// `elected` won the last seat over the other tied candidates.
    Election {
        /// Candidates tied.
        tied: Vec<CandidateId>,
        /// Candidate elected.
        elected: CandidateId,
    },
    /// `excluded` was excluded ahead of the other tied candidates.
    Exclusion {
        /// Candidates tied.
        tied: Vec<CandidateId>,
        /// Candidate excluded.
        excluded: CandidateId,
    },
}

impl TieEvent {
    fn tied(&self) -> &[CandidateId] {
        match self {
            TieEvent::ElectionOrder { order } => order,
            TieEvent::Election { tied, .. } | TieEvent::Exclusion { tied, .. } => tied,
        }
    }

    fn kind(&self) -> TieKind {
        match self {
            TieEvent::ElectionOrder { .. } => TieKind::ElectionOrder,
            TieEvent::Election { .. } => TieKind::Election,
            TieEvent::Exclusion { .. } => TieKind::Exclusion,
        }
    }

    /// `(preferred, other)` pairs implied by the event.
    fn edges(&self) -> Vec<(CandidateId, CandidateId)> {
        match self {
            TieEvent::ElectionOrder { order } => order
                .iter()
                .enumerate()
                .flat_map(|(i, &a)| order[i + 1..].iter().map(move |&b| (a, b)))
                .collect(),
            TieEvent::Election { tied, elected } => tied
                .iter()
                .filter(|&&x| x != *elected)
                .map(|&x| (*elected, x))
                .collect(),
            TieEvent::Exclusion { tied, excluded } => tied
                .iter()
                .filter(|&&x| x != *excluded)
                .map(|&x| (x, *excluded))
                .collect(),
        }
    }
}

/// Total order over candidates, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieBreakOrder {
    order: Vec<CandidateId>,
    #[serde(skip)]
    rank: HashMap<CandidateId, usize>,
}

impl TieBreakOrder {
    fn new(order: Vec<CandidateId>) -> Self {
        let rank = order.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { order, rank }
    }

    /// Candidates, most preferred first.
    pub fn as_slice(&self) -> &[CandidateId] {
        &self.order
    }

    /// Position of a candidate in the order.
    pub fn position(&self, id: CandidateId) -> Option<usize> {
        self.rank.get(&id).copied()
    }

    fn sort(&self, tied: &[CandidateId]) -> Vec<CandidateId> {
        let mut sorted = tied.to_vec();
        sorted.sort_by_key(|&c| (self.position(c).unwrap_or(usize::MAX), c));
        sorted.dedup();
        sorted
    }
}

/// How one tie was broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieResolution {
    /// Kind of tie resolved.
    pub kind: TieKind,
    /// Tied candidates, most preferred first.
    pub order: Vec<CandidateId>,
}

impl TieResolution {
    /// Candidate elected by an election tie.
    pub fn elected(&self) -> Option<CandidateId> {
        self.order.first().copied()
    }

    /// Candidate excluded by an exclusion tie.
    pub fn excluded(&self) -> Option<CandidateId> {
        self.order.last().copied()
    }

    /// True if this resolution answers `signal`.
    pub fn answers(&self, signal: &TieSignal) -> bool {
        if self.kind != signal.kind || self.order.len() != signal.tied.len() {
            return false;
        }
        let tied: HashSet<_> = signal.tied.iter().collect();
        self.order.iter().all(|c| tied.contains(c))
    }
}

/// Deterministic tie resolution service shared by every trial of an audit.
#[derive(Debug, Clone)]
pub struct TieBreakOracle {
    order: TieBreakOrder,
}

impl TieBreakOracle {
    /// Build the oracle from the ceremony seed and the official tie events.
    ///
    /// The same `seed` and `events` always yield the same order, in any
    /// process on any platform.
    pub fn new(
        roster: &CandidateRoster,
        seed: &str,
        events: &[TieEvent],
    ) -> Result<Self, TieBreakError> {
        let n = roster.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, event) in events.iter().enumerate() {
            validate_event(roster, i, event)?;
            for (a, b) in event.edges() {
                let (Some(ia), Some(ib)) = (roster.index_of(a), roster.index_of(b)) else {
                    return Err(TieBreakError::MalformedEvent { event: i });
                };
                if !adjacency[ia].contains(&ib) {
                    debug!(from = %a, to = %b, event = i, "tie-break edge");
                    adjacency[ia].push(ib);
                }
            }
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(hash_seed_string(seed));
        let sorted = random_topological_sort(&mut adjacency, &mut rng).map_err(|v| {
            TieBreakError::Cycle {
                candidate: roster.candidates()[v].id,
            }
        })?;
        let order = TieBreakOrder::new(sorted.into_iter().map(|v| roster.candidates()[v].id).collect());

        let oracle = Self { order };
        oracle.verify(events)?;
        info!(order = ?oracle.order.as_slice(), events = events.len(), "tie-break order fixed");
        Ok(oracle)
    }

    /// The derived total order.
    pub fn order(&self) -> &TieBreakOrder {
        &self.order
    }

    /// Resolve a tie reported by a counting engine.
    pub fn resolve(&self, signal: &TieSignal) -> TieResolution {
        TieResolution {
            kind: signal.kind,
            order: self.order.sort(&signal.tied),
        }
    }

    fn verify(&self, events: &[TieEvent]) -> Result<(), TieBreakError> {
        for (i, event) in events.iter().enumerate() {
            let resolution = self.resolve(&TieSignal {
                kind: event.kind(),
                step: 0,
                tied: event.tied().to_vec(),
            });
            let reproduced = match event {
                TieEvent::ElectionOrder { order } => &resolution.order == order,
                TieEvent::Election { elected, .. } => resolution.elected() == Some(*elected),
                TieEvent::Exclusion { excluded, .. } => resolution.excluded() == Some(*excluded),
            };
            if !reproduced {
                return Err(TieBreakError::Inconsistent { event: i });
            }
        }
        Ok(())
    }
}

fn validate_event(
    roster: &CandidateRoster,
    index: usize,
    event: &TieEvent,
) -> Result<(), TieBreakError> {
    let tied = event.tied();
    let mut seen = HashSet::with_capacity(tied.len());
    for &c in tied {
        if !roster.contains(c) {
            return Err(TieBreakError::UnknownCandidate(c));
        }
        if !seen.insert(c) {
            return Err(TieBreakError::MalformedEvent { event: index });
        }
    }
    let chosen = match event {
        TieEvent::ElectionOrder { .. } => None,
        TieEvent::Election { elected, .. } => Some(*elected),
        TieEvent::Exclusion { excluded, .. } => Some(*excluded),
    };
    if tied.len() < 2 || chosen.is_some_and(|c| !seen.contains(&c)) {
        return Err(TieBreakError::MalformedEvent { event: index });
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first topological sort with vertices and out-edges visited in
/// shuffled order. Returns a vertex on a cycle on failure.
fn random_topological_sort(
    adjacency: &mut [Vec<usize>],
    rng: &mut Xoshiro256PlusPlus,
) -> Result<Vec<usize>, usize> {
    let n = adjacency.len();
    let mut vertices: Vec<usize> = (0..n).collect();
    vertices.shuffle(rng);
    for edges in adjacency.iter_mut() {
        edges.shuffle(rng);
    }

    let mut marks = vec![Mark::Unvisited; n];
    let mut finished = Vec::with_capacity(n);
    for &v in &vertices {
        visit(v, adjacency, &mut marks, &mut finished)?;
    }
    finished.reverse();
    Ok(finished)
}

fn visit(
    v: usize,
    adjacency: &[Vec<usize>],
    marks: &mut [Mark],
    finished: &mut Vec<usize>,
) -> Result<(), usize> {
    match marks[v] {
        Mark::Done => return Ok(()),
        Mark::InProgress => return Err(v),
        Mark::Unvisited => {}
    }
    marks[v] = Mark::InProgress;
    for &u in &adjacency[v] {
        visit(u, adjacency, marks, finished)?;
    }
    marks[v] = Mark::Done;
    finished.push(v);
    Ok(())
}
