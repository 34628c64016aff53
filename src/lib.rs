//! Tunepipe: pipelined coordination of candidate-configuration evaluation
//! against a single slow external evaluator.
//!
//! A search driver submits configurations; the coordinator keeps a bounded
//! number in flight over a line-oriented message channel, correlates
//! asynchronously arriving results back to their pending requests, and
//! winds down cleanly on interrupt or evaluator exit.

pub mod engine;
pub mod link;
pub mod pipeline;
pub mod search;
pub mod space;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use pipeline::{
    DEFAULT_PIPELINE_DEPTH, PipelineCoordinator, PipelineError, RunEnd, TrialBudget,
};
pub use search::{TuneOpts, TuningOutcome, run_tuning};
pub use space::{Candidate, ParamSpace};

/// Result alias used by public tunepipe API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point for embedders: run a tuning session over `link` with
/// a fresh budget of `trials` and no run database.
///
/// The CLI path ([`engine::handle_run`]) additionally persists trials and
/// installs the interrupt handler; use the pieces directly when you need
/// those.
pub fn tune<L: link::EvaluatorLink>(
    link: L,
    space: &ParamSpace,
    trials: u64,
    opts: &TuneOpts,
) -> Result<TuningOutcome> {
    let budget = TrialBudget::new(trials);
    run_tuning(link, space, opts, &budget, None)
}
