//! Posterior sampler properties.

use std::sync::Arc;

use ballot_audit_core::{
    BallotPool, Candidate, CandidateRoster, PosteriorSampler, PriorConfig, Provenance, Ranking,
    ResamplingPolicy,
};

fn pool(total: u64) -> BallotPool {
    let roster = CandidateRoster::new(vec![
        Candidate::new(1, "A"),
        Candidate::new(2, "B"),
        Candidate::new(3, "C"),
        Candidate::new(4, "D"),
    ])
    .unwrap();
    let mut pool = BallotPool::new(Arc::new(roster), total);
    pool.record_round(
        1,
        [
            vec![1, 2, 3],
            vec![2, 1],
            vec![1, 2, 3],
            vec![3],
            vec![],
            vec![4, 3, 2, 1],
        ]
        .into_iter()
        .map(Ranking::from),
    );
    pool.record_round(2, vec![Ranking::from(vec![2, 4]); 3]);
    pool
}

const POLICIES: [ResamplingPolicy; 4] = [
    ResamplingPolicy::GammaDirichlet,
    ResamplingPolicy::PolyaUrn,
    ResamplingPolicy::Bootstrap,
    ResamplingPolicy::PairwiseBeta,
];

#[test]
fn observed_ballots_identical_in_every_trial() {
    let pool = pool(250);
    let snapshot = pool.snapshot();
    for policy in POLICIES {
        let sampler = PosteriorSampler::new(&snapshot, policy, PriorConfig::default(), 2);
        for trial in 0..25 {
            let population = sampler.sample_trial(1234, trial);
            assert_eq!(population.observed_ballots(), pool.observed());
            assert_eq!(population.len(), 250);

            let all = population.ballots();
            let observed: Vec<_> = all
                .iter()
                .filter(|b| b.provenance() == Provenance::Observed)
                .cloned()
                .collect();
            assert_eq!(observed.as_slice(), pool.observed());
            assert_eq!(all.len() - observed.len(), 241);
        }
    }
}

#[test]
fn imputed_portion_varies_across_trials() {
    let pool = pool(1000);
    let sampler = PosteriorSampler::new(
        &pool.snapshot(),
        ResamplingPolicy::GammaDirichlet,
        PriorConfig::default(),
        2,
    );
    let first = sampler.sample_trial(5, 0);
    let differs = (1..20).any(|t| {
        sampler.sample_trial(5, t).imputed_pattern_counts() != first.imputed_pattern_counts()
    });
    assert!(differs);
}

#[test]
fn imputed_ballots_only_use_known_patterns_or_priors() {
    let pool = pool(400);
    let sampler = PosteriorSampler::new(
        &pool.snapshot(),
        ResamplingPolicy::PolyaUrn,
        PriorConfig::default(),
        2,
    );
    let observed: Vec<&Ranking> = pool.observed().iter().map(|b| b.ranking()).collect();
    let population = sampler.sample_trial(77, 3);
    for ballot in population.imputed_ballots() {
        assert_eq!(ballot.provenance(), Provenance::UnobservedSimulated);
        assert!(observed.contains(&ballot.ranking()) || ballot.ranking().len() == 1);
    }
}

#[test]
fn gamma_dirichlet_mean_tracks_observed_share() {
    // 30 of 40 observed ballots rank candidate 1 first; the imputed share
    // averages close to 0.75 (slightly lower because of the prior mass).
    let roster = CandidateRoster::new(vec![Candidate::new(1, "A"), Candidate::new(2, "B")]).unwrap();
    let mut pool = BallotPool::new(Arc::new(roster), 1040);
    pool.record_round(1, vec![Ranking::from(vec![1, 2]); 30]);
    pool.record_round(1, vec![Ranking::from(vec![2, 1]); 10]);
    let sampler = PosteriorSampler::new(
        &pool.snapshot(),
        ResamplingPolicy::GammaDirichlet,
        PriorConfig::default(),
        1,
    );

    let trials = 400;
    let mean_share: f64 = (0..trials)
        .map(|t| {
            let population = sampler.sample_trial(9, t);
            population.imputed_pattern_counts()[0] as f64 / 1000.0
        })
        .sum::<f64>()
        / trials as f64;
    assert!((mean_share - 30.0 / 41.0).abs() < 0.03, "mean share {}", mean_share);
}

#[test]
fn pairwise_margins_track_observed_head_to_head() {
    let roster = CandidateRoster::new(vec![Candidate::new(1, "A"), Candidate::new(2, "B")]).unwrap();
    let mut pool = BallotPool::new(Arc::new(roster), 1040);
    pool.record_round(1, vec![Ranking::from(vec![1, 2]); 30]);
    pool.record_round(1, vec![Ranking::from(vec![2, 1]); 10]);
    let sampler = PosteriorSampler::new(
        &pool.snapshot(),
        ResamplingPolicy::PairwiseBeta,
        PriorConfig::default(),
        1,
    );

    let a_first = Ranking::from(vec![1, 2]);
    let trials = 200;
    let mean_share: f64 = (0..trials)
        .map(|t| {
            let population = sampler.sample_trial(11, t);
            let n: u64 = population
                .generated()
                .iter()
                .filter(|(r, _)| *r == a_first)
                .map(|(_, n)| n)
                .sum();
            n as f64 / 1000.0
        })
        .sum::<f64>()
        / trials as f64;
    // Beta(31, 11) has mean 31/42.
    assert!((mean_share - 31.0 / 42.0).abs() < 0.03, "mean share {}", mean_share);
}
