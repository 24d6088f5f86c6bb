//! Round-by-round audit control.
//!
//! The outer loop is strictly sequential. [`audit_round`] is a pure
//! transition `(AuditState, new ballots) → AuditState'`: it admits the
//! round's ballots into a copy of the pool, estimates the risk, applies the
//! stopping rule and, when continuing, proposes the next round size.

mod advisor;
mod config;
mod state;
mod step;
mod stopping;

pub use advisor::{EscalationPolicy, SampleSizeAdvisor};
pub use config::RoundConfig;
pub use state::{AuditState, RoundRecord};
pub use step::{audit_round, audit_round_cancellable, RoundContext, RoundOutcome};
pub use stopping::{AuditStatus, StopReason, StoppingRule};
