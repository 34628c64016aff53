//! The tuning run: claim trials from the budget, submit candidates through
//! the coordinator, absorb completed reports, and wind down.

use std::collections::HashMap;

use anyhow::Result;
use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info, warn};
use rusqlite::Connection;

use crate::engine::progress::{ProgressBar, create_progress_bar, update_progress_bar};
use crate::engine::rundb;
use crate::link::EvaluatorLink;
use crate::pipeline::{
    DEFAULT_PIPELINE_DEPTH, PipelineCoordinator, PipelineError, RunEnd, TrialBudget,
};
use crate::space::{Candidate, ParamSpace};
use crate::types::{RequestHandle, TrialOutcome, TrialReport};

use super::technique::SearchTechnique;

/// Knobs for one tuning run.
#[derive(Clone, Debug)]
pub struct TuneOpts {
    /// In-flight window; `submit` stalls once this many evaluations are
    /// outstanding.
    pub depth: usize,
    /// Candidate-generation seed. None draws from entropy.
    pub seed: Option<u64>,
    /// Show a progress bar over the trial budget.
    pub verbose: bool,
}

impl Default for TuneOpts {
    fn default() -> Self {
        TuneOpts {
            depth: DEFAULT_PIPELINE_DEPTH,
            seed: None,
            verbose: false,
        }
    }
}

/// What a finished run produced.
#[derive(Clone, Debug)]
pub struct TuningOutcome {
    pub end: RunEnd,
    /// Best measured candidate and its time in milliseconds.
    pub best: Option<(Candidate, f64)>,
    /// Candidates handed to the coordinator.
    pub submitted: u64,
    /// Reports received back (measured, failed, or aborted).
    pub reported: u64,
}

/// Run a full tuning session over `link`.
///
/// Submits candidates until the budget runs out (the interrupt handler may
/// zero it early), sends the best-found configuration as the final one, and
/// tears the coordinator down. Every trial is recorded in `db` when given.
/// Completed reports are absorbed between coordinator calls, so the sink
/// channel never grows past the in-flight window.
pub fn run_tuning<L: EvaluatorLink>(
    link: L,
    space: &ParamSpace,
    opts: &TuneOpts,
    budget: &TrialBudget,
    db: Option<&Connection>,
) -> Result<TuningOutcome> {
    let (report_tx, report_rx) = unbounded::<TrialReport>();
    let mut coordinator = PipelineCoordinator::new(link, report_tx, opts.depth);
    let mut technique = SearchTechnique::new(opts.seed);

    let bar = opts
        .verbose
        .then(|| create_progress_bar(budget.remaining() as usize, "Tuning"));

    let mut submitted: HashMap<RequestHandle, Candidate> = HashMap::new();
    let mut best: Option<(Candidate, f64)> = None;
    let mut reported = 0_u64;
    let mut next_handle = 1_u64;
    let mut end = RunEnd::Completed;

    while budget.take() {
        let candidate = technique.next_candidate(space, best.as_ref().map(|(c, _)| c));
        let handle = RequestHandle(next_handle);
        next_handle += 1;
        if let Some(conn) = db {
            rundb::record_submitted(conn, handle, &candidate)?;
        }
        match coordinator.submit(&candidate, handle) {
            Ok(_) => {
                submitted.insert(handle, candidate);
            }
            Err(PipelineError::EvaluatorExit) => {
                end = RunEnd::EvaluatorExit;
                break;
            }
            Err(err) => return Err(err.into()),
        }
        reported += absorb_reports(&report_rx, &submitted, &mut best, db, bar.as_ref())?;
    }

    if end != RunEnd::EvaluatorExit {
        if budget.interrupted() {
            end = RunEnd::Interrupted;
        }
        reported += absorb_reports(&report_rx, &submitted, &mut best, db, bar.as_ref())?;
        if let Some((best_candidate, best_millis)) = best.clone() {
            debug!("finalizing with best candidate at {:.3}ms", best_millis);
            match coordinator.finalize(&best_candidate) {
                Ok(()) => {
                    if let Some(conn) = db {
                        rundb::record_final(conn, &best_candidate)?;
                    }
                }
                Err(PipelineError::EvaluatorExit) => end = RunEnd::EvaluatorExit,
                Err(err) => return Err(err.into()),
            }
        } else {
            warn!("no successful trials; skipping final configuration");
        }
    }

    coordinator.teardown()?;
    reported += absorb_reports(&report_rx, &submitted, &mut best, db, bar.as_ref())?;

    let outcome = TuningOutcome {
        end,
        best,
        submitted: next_handle - 1,
        reported,
    };
    info!(
        "run over: {} submitted, {} reported",
        outcome.submitted, outcome.reported
    );
    Ok(outcome)
}

/// Pull every queued report off the sink channel: persist it, advance the
/// best candidate, and bump the progress bar. Returns how many were
/// absorbed.
fn absorb_reports(
    rx: &Receiver<TrialReport>,
    submitted: &HashMap<RequestHandle, Candidate>,
    best: &mut Option<(Candidate, f64)>,
    db: Option<&Connection>,
    bar: Option<&ProgressBar>,
) -> Result<u64> {
    let mut absorbed = 0_u64;
    for report in rx.try_iter() {
        absorbed += 1;
        if let Some(conn) = db {
            rundb::record_outcome(conn, report.handle, report.outcome)?;
        }
        if let TrialOutcome::Time(millis) = report.outcome {
            let best_so_far = best.as_ref().map(|(_, m)| *m).unwrap_or(f64::INFINITY);
            if millis < best_so_far {
                match submitted.get(&report.handle) {
                    Some(candidate) => {
                        debug!("new best: handle {} at {:.3}ms", report.handle, millis);
                        *best = Some((candidate.clone(), millis));
                    }
                    None => warn!("report for handle {} never submitted here", report.handle),
                }
            }
        }
        if let Some(bar) = bar {
            update_progress_bar(bar, 1);
        }
    }
    Ok(absorbed)
}
