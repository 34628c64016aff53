//! Pipelined result correlation: dispatch, drain, wind-down.

pub mod coordinator;
pub mod correlation;
pub mod shutdown;
pub mod wire;

pub use coordinator::{
    CoordinatorState, DEFAULT_PIPELINE_DEPTH, Drained, PipelineCoordinator,
};
pub use correlation::{CorrelationTable, PendingRequest};
pub use shutdown::{RunEnd, TrialBudget, install_interrupt_handler};

use thiserror::Error;

use crate::link::LinkError;
use crate::types::DispatchId;

/// Fatal coordinator errors. None of these is retried: the evaluator
/// connection is single and irreplaceable within a run, so every variant
/// unwinds to the top level with enough context to tell whether the
/// evaluator or the coordinator is at fault. An evaluation that merely
/// failed is not an error; it reaches the driver as a worst-case outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("evaluator channel: {0}")]
    Channel(#[from] LinkError),

    #[error("malformed evaluator report {line:?}: expected \"<id>:<millis>\" or \"exit\"")]
    Protocol { line: String },

    /// A result named a dispatch id with no pending entry: a duplicate
    /// delivery, a stale evaluator, or a coordinator bug.
    #[error("result for unknown dispatch id {id} ({in_flight} in flight)")]
    UnknownCorrelation { id: DispatchId, in_flight: usize },

    /// The pending table would exceed the pipeline depth; a coordinator
    /// logic bug, checked defensively.
    #[error("correlation table would hold {in_flight} entries, over pipeline depth {depth}")]
    CapacityInvariant { in_flight: usize, depth: usize },

    /// A dispatch id was issued twice while still pending.
    #[error("dispatch id {id} is already in flight")]
    DuplicateDispatch { id: DispatchId },

    /// The evaluator ended the session while the caller was waiting for
    /// pipeline capacity. Run-ending, not a transport fault.
    #[error("evaluator ended the session")]
    EvaluatorExit,

    #[error("{op} called in state {state:?}")]
    BadState {
        op: &'static str,
        state: CoordinatorState,
    },
}
