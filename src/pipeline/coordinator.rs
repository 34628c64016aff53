//! The pipelined result-correlation coordinator.
//!
//! Single logical thread of control: the driver calls in, and the only
//! blocking operation is the channel read inside [`PipelineCoordinator::drain_one`].
//! Concurrency is external (the evaluator works on dispatched configurations
//! while the driver keeps submitting up to the pipeline depth).

use log::{debug, warn};

use crate::link::EvaluatorLink;
use crate::space::Candidate;
use crate::types::{DispatchId, RequestHandle, ResultSink, TrialOutcome, TrialReport};

use super::correlation::{CorrelationTable, PendingRequest};
use super::{PipelineError, wire};

/// How many evaluations may be in flight at once before `submit` blocks.
pub const DEFAULT_PIPELINE_DEPTH: usize = 2;

/// Coordinator lifecycle. Transitions are forward-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Submissions, dispatch, and result processing all allowed.
    Accepting,
    /// No new submissions; outstanding results still resolve.
    Draining,
    /// Terminal. The channel is closed.
    Stopped,
}

/// What one drain observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Drained {
    /// A result resolved and was delivered to the sink.
    Result(TrialReport),
    /// The evaluator sent the session-end sentinel; the channel is closing.
    SessionEnd,
}

/// Coordinates speculative evaluation of candidates against one slow
/// external evaluator: dispatches work tagged with fresh correlation ids,
/// bounds the in-flight window, matches results back to pending requests,
/// and winds down deterministically.
pub struct PipelineCoordinator<L: EvaluatorLink, S: ResultSink> {
    link: L,
    sink: S,
    table: CorrelationTable,
    depth: usize,
    next_id: DispatchId,
    state: CoordinatorState,
    peer_closed: bool,
}

impl<L: EvaluatorLink, S: ResultSink> PipelineCoordinator<L, S> {
    /// A `depth` of 0 is clamped to 1; the pipeline needs at least one slot
    /// to make progress.
    pub fn new(link: L, sink: S, depth: usize) -> Self {
        let depth = depth.max(1);
        PipelineCoordinator {
            link,
            sink,
            table: CorrelationTable::new(depth),
            depth,
            next_id: 1,
            state: CoordinatorState::Accepting,
            peer_closed: false,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Outstanding dispatches awaiting a result.
    pub fn in_flight(&self) -> usize {
        self.table.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dispatch `candidate` to the evaluator, first draining one completed
    /// result if the window is full.
    ///
    /// This is the sole backpressure point: a driver submitting faster than
    /// the evaluator completes will stall here until a result frees a slot.
    /// Returns [`PipelineError::EvaluatorExit`] if the evaluator ends the
    /// session while we wait for that slot.
    pub fn submit(
        &mut self,
        candidate: &Candidate,
        handle: RequestHandle,
    ) -> Result<DispatchId, PipelineError> {
        self.ensure_accepting("submit")?;
        self.make_room()?;
        self.dispatch(candidate, handle)
    }

    /// Block for one inbound message and act on it: resolve a result
    /// against the pending table and deliver it to the sink, or observe the
    /// session-end sentinel (after which this returns `SessionEnd` without
    /// reading again).
    pub fn drain_one(&mut self) -> Result<Drained, PipelineError> {
        if self.state == CoordinatorState::Stopped {
            return Err(PipelineError::BadState {
                op: "drain_one",
                state: self.state,
            });
        }
        if self.peer_closed {
            return Ok(Drained::SessionEnd);
        }
        let line = self.link.recv_line()?;
        match wire::parse_report(&line)? {
            wire::Inbound::Exit => {
                warn!("evaluator requested session end");
                self.peer_closed = true;
                if self.state == CoordinatorState::Accepting {
                    self.state = CoordinatorState::Draining;
                }
                Ok(Drained::SessionEnd)
            }
            wire::Inbound::Timing { id, millis } => {
                let pending =
                    self.table
                        .remove(id)
                        .ok_or_else(|| PipelineError::UnknownCorrelation {
                            id,
                            in_flight: self.table.len(),
                        })?;
                let outcome = if millis < 0.0 {
                    warn!("configuration {} failed on the evaluator", id);
                    TrialOutcome::Failed
                } else {
                    debug!("configuration {} ran in {:.3}ms", id, millis);
                    TrialOutcome::Time(millis)
                };
                let report = TrialReport {
                    handle: pending.handle,
                    outcome,
                };
                self.sink.report(report);
                Ok(Drained::Result(report))
            }
        }
    }

    /// Send the best-found candidate as the distinguished final
    /// configuration and wait for the evaluator's acknowledgment.
    ///
    /// Applies the same capacity discipline as `submit`, announces with the
    /// completion sentinel, then drains until the acknowledgment sentinel
    /// arrives; results for still-outstanding dispatches resolve normally
    /// along the way. The coordinator is draining afterwards; only
    /// `teardown` remains valid.
    pub fn finalize(&mut self, best: &Candidate) -> Result<(), PipelineError> {
        self.ensure_accepting("finalize")?;
        self.make_room()?;
        self.link.send_line(wire::COMPLETED)?;
        self.link
            .send_line(&wire::encode_candidate(best, wire::FINAL_PREFIX))?;
        debug!("final configuration sent, awaiting acknowledgment");
        self.state = CoordinatorState::Draining;
        loop {
            match self.drain_one()? {
                Drained::Result(_) => {}
                Drained::SessionEnd => return Ok(()),
            }
        }
    }

    /// Stop accepting work, resolve the remaining outstanding requests, and
    /// close the channel. When the evaluator already ended the session,
    /// nothing further will arrive: every still-pending handle is reported
    /// as aborted instead, never silently dropped. Idempotent; the channel
    /// is closed exactly once.
    pub fn teardown(&mut self) -> Result<(), PipelineError> {
        if self.state == CoordinatorState::Stopped {
            return Ok(());
        }
        self.state = CoordinatorState::Draining;
        while !self.peer_closed && !self.table.is_empty() {
            if let Drained::SessionEnd = self.drain_one()? {
                break;
            }
        }
        for (id, pending) in self.table.take_all() {
            warn!(
                "no result for configuration {} (handle {}); reporting abort",
                id, pending.handle
            );
            self.sink.report(TrialReport {
                handle: pending.handle,
                outcome: TrialOutcome::Aborted,
            });
        }
        self.link.close()?;
        self.state = CoordinatorState::Stopped;
        Ok(())
    }

    fn ensure_accepting(&self, op: &'static str) -> Result<(), PipelineError> {
        if self.state != CoordinatorState::Accepting {
            return Err(PipelineError::BadState {
                op,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Single-threaded, so the capacity check and the dispatch that follows
    /// cannot interleave; a table over depth here is a logic bug.
    fn make_room(&mut self) -> Result<(), PipelineError> {
        let in_flight = self.table.len();
        if in_flight > self.depth {
            return Err(PipelineError::CapacityInvariant {
                in_flight,
                depth: self.depth,
            });
        }
        if in_flight == self.depth {
            match self.drain_one()? {
                Drained::Result(_) => {}
                Drained::SessionEnd => return Err(PipelineError::EvaluatorExit),
            }
        }
        Ok(())
    }

    /// Exactly one outbound message per call. The pending record is
    /// inserted only after the send succeeds, and a failed send consumes no
    /// dispatch id.
    fn dispatch(
        &mut self,
        candidate: &Candidate,
        handle: RequestHandle,
    ) -> Result<DispatchId, PipelineError> {
        let id = self.next_id;
        let line = wire::encode_candidate(candidate, &id.to_string());
        self.link.send_line(&line)?;
        self.next_id += 1;
        self.table.insert(id, PendingRequest { handle })?;
        debug!("dispatched configuration {} (handle {})", id, handle);
        Ok(id)
    }
}
