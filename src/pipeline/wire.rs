//! Line codec for the evaluator protocol.
//!
//! Outbound: one JSON object per line, the candidate's parameters plus a
//! `configPrefix` correlation tag (the dispatch id as a string, or `final`).
//! Inbound: `<dispatchId>:<elapsedMillis>` per line, or the `exit` sentinel.

use crate::space::Candidate;
use crate::types::DispatchId;

use super::PipelineError;

/// Announces that the next outbound configuration is the final one and the
/// evaluator should persist it and acknowledge.
pub const COMPLETED: &str = "Completed";

/// Inbound sentinel: the evaluator is ending the session.
pub const EXIT: &str = "exit";

/// Correlation tag carried by the final configuration instead of an id.
pub const FINAL_PREFIX: &str = "final";

/// One parsed inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Session-end sentinel; the channel is closing.
    Exit,
    /// Timing report for a dispatched configuration. Negative millis means
    /// the configuration failed on the evaluator side.
    Timing { id: DispatchId, millis: f64 },
}

/// Serialize a candidate with its correlation tag into the one-line wire
/// form. serde_json never emits newlines here, so the line framing holds.
pub fn encode_candidate(candidate: &Candidate, prefix: &str) -> String {
    serde_json::json!({
        "params": candidate,
        "configPrefix": prefix,
    })
    .to_string()
}

/// Parse one inbound line (newline already stripped). Anything that is
/// neither the exit sentinel nor a two-field `id:millis` pair is a protocol
/// violation and fatal to the session.
pub fn parse_report(line: &str) -> Result<Inbound, PipelineError> {
    if line == EXIT {
        return Ok(Inbound::Exit);
    }
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() != 2 {
        return Err(PipelineError::Protocol {
            line: line.to_string(),
        });
    }
    let id: DispatchId = fields[0].parse().map_err(|_| PipelineError::Protocol {
        line: line.to_string(),
    })?;
    let millis: f64 = fields[1].parse().map_err(|_| PipelineError::Protocol {
        line: line.to_string(),
    })?;
    Ok(Inbound::Timing { id, millis })
}
