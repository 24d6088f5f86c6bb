//! Tie-break oracle determinism.

use ballot_audit_core::{
    BallotGroup, Candidate, CandidateId, CandidateRoster, OutcomeSimulator, Stv, TieBreakOracle,
    TieEvent, TieKind, TieSignal, TrialOutcome,
};

fn roster() -> CandidateRoster {
    CandidateRoster::new((1..=6).map(|i| Candidate::new(i, format!("C{}", i))).collect()).unwrap()
}

fn ids(v: &[u32]) -> Vec<CandidateId> {
    v.iter().copied().map(CandidateId).collect()
}

#[test]
fn same_seed_same_resolution_across_instances() {
    let events = vec![TieEvent::Exclusion {
        tied: ids(&[2, 5]),
        excluded: CandidateId(5),
    }];
    let signal = TieSignal {
        kind: TieKind::Election,
        step: 0,
        tied: ids(&[1, 3, 4, 6]),
    };
    let first = TieBreakOracle::new(&roster(), "4 2 6 1 3 3", &events)
        .unwrap()
        .resolve(&signal);
    for _ in 0..10 {
        let oracle = TieBreakOracle::new(&roster(), "4 2 6 1 3 3", &events).unwrap();
        assert_eq!(oracle.resolve(&signal), first);
        assert_eq!(oracle.resolve(&signal), first);
    }
}

#[test]
fn order_is_stable_across_processes() {
    // The order is a pure function of the seed string and the events; pin it
    // so a change in hashing or shuffling is caught.
    let a = TieBreakOracle::new(&roster(), "pinned", &[]).unwrap();
    assert_eq!(a.order().as_slice(), ids(&[3, 2, 6, 1, 5, 4]).as_slice());
    let b = TieBreakOracle::new(&roster(), "pinned", &[]).unwrap();
    assert_eq!(a.order().as_slice(), b.order().as_slice());
    let c = TieBreakOracle::new(&roster(), "different", &[]).unwrap();
    let d = TieBreakOracle::new(&roster(), "yet another", &[]).unwrap();
    let distinct = [c.order().as_slice(), d.order().as_slice()]
        .iter()
        .any(|o| *o != a.order().as_slice());
    assert!(distinct);
}

#[test]
fn simulator_reuses_oracle_for_every_trial() {
    let roster = roster();
    let oracle = TieBreakOracle::new(
        &roster,
        "seed",
        &[TieEvent::Election {
            tied: ids(&[1, 2]),
            elected: CandidateId(2),
        }],
    )
    .unwrap();
    let sim = OutcomeSimulator::new(&Stv, &oracle, &roster, 1);
    let a = ids(&[1]);
    let b = ids(&[2]);
    let ballots = [
        BallotGroup { ranking: &a, weight: 10 },
        BallotGroup { ranking: &b, weight: 10 },
    ];
    for _ in 0..50 {
        match sim.tabulate(&ballots) {
            TrialOutcome::Completed { winners, ties_resolved } => {
                assert_eq!(winners.0, ids(&[2]));
                assert!(ties_resolved >= 1);
            }
            TrialOutcome::Discarded(e) => panic!("unexpected discard: {}", e),
        }
    }
}
