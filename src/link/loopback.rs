//! In-process transport over crossbeam channels, for tests and embedded
//! evaluators.

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{EvaluatorLink, LinkError};

/// One end of an in-process message channel. Create a connected pair with
/// [`loopback_pair`]; either end can play the evaluator.
pub struct LoopbackLink {
    tx: Option<Sender<String>>,
    rx: Receiver<String>,
    closed: bool,
}

/// Two connected ends: what one sends, the other receives.
pub fn loopback_pair() -> (LoopbackLink, LoopbackLink) {
    let (a_tx, b_rx) = unbounded();
    let (b_tx, a_rx) = unbounded();
    (
        LoopbackLink {
            tx: Some(a_tx),
            rx: a_rx,
            closed: false,
        },
        LoopbackLink {
            tx: Some(b_tx),
            rx: b_rx,
            closed: false,
        },
    )
}

impl EvaluatorLink for LoopbackLink {
    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        match &self.tx {
            Some(tx) => tx.send(line.to_string()).map_err(|_| LinkError::Closed),
            None => Err(LinkError::Closed),
        }
    }

    fn recv_line(&mut self) -> Result<String, LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.rx.recv().map_err(|_| LinkError::Closed)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.closed = true;
        // Dropping the sender lets the peer's recv observe the close.
        self.tx = None;
        Ok(())
    }
}
