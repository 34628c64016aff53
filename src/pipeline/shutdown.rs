//! Cooperative wind-down: interrupt handling via the trial budget, and the
//! exit-status mapping for how a run ended.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Context, Result};
use log::warn;

/// Remaining-evaluations budget shared between the search loop and the
/// interrupt handler. The handler only zeroes the budget; the loop then
/// exits through its normal termination check, so no request is left in an
/// inconsistent state relative to the run record.
#[derive(Clone)]
pub struct TrialBudget {
    remaining: Arc<AtomicU64>,
    interrupted: Arc<AtomicBool>,
}

impl TrialBudget {
    pub fn new(trials: u64) -> Self {
        TrialBudget {
            remaining: Arc::new(AtomicU64::new(trials)),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim one trial. Returns false once the budget is exhausted.
    pub fn take(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Zero the budget so the owning loop stops on its next check.
    pub fn exhaust(&self) {
        self.remaining.store(0, Ordering::SeqCst);
    }

    /// True when an interrupt (rather than natural exhaustion) zeroed the
    /// budget.
    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Cooperative stop: zero the budget and mark the run interrupted.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.exhaust();
    }
}

/// Install the Ctrl+C handler for the run. The handler touches nothing but
/// the shared budget atomics; draining and channel close happen on the
/// driver thread through the loop's normal exit path.
pub fn install_interrupt_handler(budget: &TrialBudget) -> Result<()> {
    let budget = budget.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received; finishing outstanding evaluations");
        budget.interrupt();
    })
    .context("set Ctrl+C handler")
}

/// Why the run ended. Maps onto the process exit status so callers can tell
/// a normal completion from an evaluator- or signal-initiated one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// Budget exhausted and final configuration acknowledged.
    Completed,
    /// The evaluator ended the session before the run finished.
    EvaluatorExit,
    /// An interrupt signal zeroed the budget; the run wound down cleanly.
    Interrupted,
}

impl RunEnd {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunEnd::Completed => ExitCode::SUCCESS,
            RunEnd::EvaluatorExit => ExitCode::from(1),
            // 128 + SIGINT, the conventional interrupted status.
            RunEnd::Interrupted => ExitCode::from(130),
        }
    }
}
