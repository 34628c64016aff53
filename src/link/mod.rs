//! Message channel to the evaluator: trait plus TCP and in-process transports.

mod loopback;
mod tcp;

pub use loopback::{LoopbackLink, loopback_pair};
pub use tcp::TcpLink;

use thiserror::Error;

/// Transport failure on the evaluator channel. The connection is single and
/// irreplaceable within a run, so these are fatal and never retried.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The channel was closed, locally or by the peer.
    #[error("evaluator channel closed")]
    Closed,
    #[error("evaluator channel I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking, line-oriented, bidirectional channel to the evaluator.
///
/// Exactly one send or one receive uses the channel at a time; the
/// coordinator is single-threaded, so implementations need no internal
/// locking. `close` must be called at most once; a second call is an error,
/// which the coordinator's state machine rules out.
pub trait EvaluatorLink {
    /// Send one message. `line` must not contain a newline.
    fn send_line(&mut self, line: &str) -> Result<(), LinkError>;

    /// Block until one message arrives. The returned line has its trailing
    /// newline stripped. A closed channel yields [`LinkError::Closed`].
    fn recv_line(&mut self) -> Result<String, LinkError>;

    /// Close this side of the channel.
    fn close(&mut self) -> Result<(), LinkError>;
}
