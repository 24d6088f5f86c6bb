//! Command-line front end for Bayesian ballot-polling audits.
//!
//! # Usage
//!
//! ```bash
//! # Replay transcribed rounds against a contest configuration
//! ballot-audit audit --config contest.json --round round1.csv --round round2.csv
//!
//! # Same, emitting one JSON report per round
//! ballot-audit audit --config contest.json --round round1.csv --json
//!
//! # Drill: audit a simulated 5-candidate, 2-seat election of 10,000 ballots
//! ballot-audit simulate --candidates 5 --ballots 10000 --seats 2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use ballot_audit::output::{format_round, format_summary, summary_to_json_pretty, to_json};
use ballot_audit::{
    AuditConfig, BayesianAudit, ConfigError, CountingMethod, Error, SimulatedElection,
};

/// Bayesian ballot-polling audits of ranked-choice elections
#[derive(Parser, Debug)]
#[command(name = "ballot-audit")]
#[command(about = "Decide, round by round, whether sampled ballots confirm a reported outcome")]
#[command(version)]
struct Args {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay rounds of transcribed ballots against a contest configuration
    Audit {
        /// Contest configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Ballot file for one round; repeat in round order
        #[arg(short, long = "round", required = true)]
        rounds: Vec<PathBuf>,

        /// Emit JSON instead of formatted reports
        #[arg(long)]
        json: bool,
    },

    /// Run a complete audit of a simulated election
    Simulate {
        /// Number of candidates
        #[arg(long, default_value = "5")]
        candidates: u32,

        /// Number of ballots cast
        #[arg(long, default_value = "10000")]
        ballots: u64,

        /// Seats to fill
        #[arg(long, default_value = "2")]
        seats: usize,

        /// Monte Carlo trials per round
        #[arg(long, default_value = "1000")]
        trials: u64,

        /// Seed for both the simulated ballots and the trials
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Counting method
        #[arg(long, value_enum, default_value = "borda")]
        method: Method,

        /// Risk limit
        #[arg(long, default_value = "0.05")]
        risk_limit: f64,

        /// Emit JSON instead of formatted reports
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    Stv,
    Borda,
}

impl From<Method> for CountingMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Stv => CountingMethod::Stv,
            Method::Borda => CountingMethod::Borda,
        }
    }
}

fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    init_tracing(level);

    let result = match args.command {
        Command::Audit {
            config,
            rounds,
            json,
        } => run_audit(config, rounds, json),
        Command::Simulate {
            candidates,
            ballots,
            seats,
            trials,
            seed,
            method,
            risk_limit,
            json,
        } => run_simulation(candidates, ballots, seats, trials, seed, method, risk_limit, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_audit(config: PathBuf, rounds: Vec<PathBuf>, json: bool) -> Result<(), Error> {
    let config = AuditConfig::from_json_file(&config)?.from_env();
    let mut audit = BayesianAudit::new(config)?;
    let roster = Arc::clone(audit.contest().roster());
    info!(first_round = audit.initial_sample_size(), "suggested first round size");

    for path in &rounds {
        if audit.state().is_concluded() {
            info!(file = %path.display(), "audit concluded; ignoring remaining rounds");
            break;
        }
        let report = audit.run_round_from_file(path)?;
        if json {
            println!("{}", to_json(report)?);
        } else {
            print!("{}", format_round(report, &roster));
        }
    }

    print_summary(&audit, json)
}

#[allow(clippy::too_many_arguments)]
fn run_simulation(
    candidates: u32,
    ballots: u64,
    seats: usize,
    trials: u64,
    seed: u64,
    method: Method,
    risk_limit: f64,
    json: bool,
) -> Result<(), Error> {
    check_drill(candidates, ballots, seats, trials, risk_limit)?;
    let mut election = SimulatedElection::new(candidates, ballots, seats, seed);
    let config = election
        .config_builder()
        .counting_method(method.into())
        .trials(trials)
        .seed(seed)
        .risk_limit(risk_limit)
        .build()?
        .from_env();
    let mut audit = BayesianAudit::new(config)?;
    let roster = Arc::clone(audit.contest().roster());

    while let Some(size) = audit.next_sample_size() {
        let batch = election.draw(size);
        if batch.is_empty() {
            break;
        }
        let report = audit.run_round(batch)?;
        if json {
            println!("{}", to_json(report)?);
        } else {
            print!("{}", format_round(report, &roster));
        }
    }

    print_summary(&audit, json)
}

fn print_summary(audit: &BayesianAudit, json: bool) -> Result<(), Error> {
    let summary = audit.summary();
    if json {
        println!("{}", summary_to_json_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary, audit.contest().roster()));
        if let Some(next) = audit.next_sample_size() {
            println!("Audit not concluded: draw {} more ballots for the next round.", next);
        }
    }
    Ok(())
}

fn check_drill(
    candidates: u32,
    ballots: u64,
    seats: usize,
    trials: u64,
    risk_limit: f64,
) -> Result<(), ConfigError> {
    if candidates == 0 {
        return Err(ConfigError::NoCandidates);
    }
    if ballots == 0 {
        return Err(ConfigError::Zero("ballots"));
    }
    if seats == 0 {
        return Err(ConfigError::Zero("seats"));
    }
    if seats > candidates as usize {
        return Err(ConfigError::TooManySeats {
            seats,
            candidates: candidates as usize,
        });
    }
    if trials == 0 {
        return Err(ConfigError::Zero("trials"));
    }
    if !(risk_limit > 0.0 && risk_limit < 1.0) {
        return Err(ConfigError::RiskLimit(risk_limit));
    }
    Ok(())
}
