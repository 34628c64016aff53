//! TCP transport: one stream, line-delimited messages.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};

use log::debug;

use super::{EvaluatorLink, LinkError};

/// Line-delimited channel over a single TCP stream.
pub struct TcpLink {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    closed: bool,
}

impl TcpLink {
    /// Dial the evaluator at `addr` (host:port).
    pub fn connect(addr: &str) -> Result<Self, LinkError> {
        let stream = TcpStream::connect(addr)?;
        debug!("connected to evaluator at {}", addr);
        Self::from_stream(stream)
    }

    /// Bind `addr` and wait for the evaluator to dial in. Accepts exactly
    /// one connection.
    pub fn accept(addr: &str) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(addr)?;
        debug!("waiting for evaluator on {}", addr);
        let (stream, peer) = listener.accept()?;
        debug!("evaluator connected from {}", peer);
        Self::from_stream(stream)
    }

    fn from_stream(stream: TcpStream) -> Result<Self, LinkError> {
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(TcpLink {
            reader,
            writer: stream,
            closed: false,
        })
    }
}

impl EvaluatorLink for TcpLink {
    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<String, LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(LinkError::Closed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.closed = true;
        // The peer may have hung up first; that still counts as closed.
        match self.writer.shutdown(Shutdown::Both) {
            Err(err) if err.kind() != std::io::ErrorKind::NotConnected => Err(err.into()),
            _ => Ok(()),
        }
    }
}
