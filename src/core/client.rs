//! Device client
//!
//! Blocking TCP client that sends request frames and collects the device's
//! response frames.

use crate::{
    core::{
        frame::{ReceiveFrame, SendFrame},
        registry::ObjectInfo,
        types::Command,
        value::{Value, decode_value},
    },
    error::{RctError, Result},
};
use std::{
    io::{ErrorKind, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::{Duration, Instant},
};
use tracing::{debug, instrument, warn};

const RECEIVE_CHUNK: usize = 1024;

/// Connection to an inverter, or to the simulator
#[derive(Debug)]
pub struct RctClient {
    stream: TcpStream,
    timeout: Duration,
    /// Bytes received after the end of the last frame
    pending: Vec<u8>,
}

impl RctClient {
    /// Connect to `host:port`, trying every resolved address
    #[instrument]
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            RctError::connection(format!("Could not resolve {host}:{port}"), e)
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_write_timeout(Some(timeout))
                        .map_err(|e| RctError::connection("Failed to set write timeout", e))?;
                    debug!("Connected to {}", addr);
                    return Ok(Self {
                        stream,
                        timeout,
                        pending: Vec::new(),
                    });
                }
                Err(e) => {
                    debug!("Connecting to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let source = last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
        });
        Err(RctError::connection(
            format!("Could not connect to {host}:{port}"),
            source,
        ))
    }

    pub fn send(&mut self, frame: &SendFrame) -> Result<()> {
        debug!(
            "Sending {} bytes: {}",
            frame.data().len(),
            hex(frame.data())
        );
        self.stream
            .write_all(frame.data())
            .map_err(|e| RctError::connection("Failed to send frame", e))
    }

    /// Wait for the next complete frame
    pub fn receive(&mut self) -> Result<ReceiveFrame> {
        let deadline = Instant::now() + self.timeout;
        let mut frame = ReceiveFrame::new();

        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            if let Some(frame) = self.feed(&mut frame, &pending)? {
                return Ok(frame);
            }
        }

        let mut buf = [0u8; RECEIVE_CHUNK];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RctError::Timeout {
                    after: self.timeout,
                });
            }
            self.stream
                .set_read_timeout(Some(remaining))
                .map_err(|e| RctError::connection("Failed to set read timeout", e))?;

            let n = match self.stream.read(&mut buf) {
                Ok(0) => {
                    return Err(RctError::connection(
                        "Connection closed by peer",
                        std::io::Error::from(ErrorKind::UnexpectedEof),
                    ));
                }
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(RctError::Timeout {
                        after: self.timeout,
                    });
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(RctError::connection("Failed to receive", e)),
            };

            debug!("Received {} bytes: {}", n, hex(&buf[..n]));
            if let Some(frame) = self.feed(&mut frame, &buf[..n])? {
                return Ok(frame);
            }
        }
    }

    fn feed(&mut self, frame: &mut ReceiveFrame, input: &[u8]) -> Result<Option<ReceiveFrame>> {
        let consumed = match frame.consume(input) {
            Ok(consumed) => consumed,
            Err(
                e @ (RctError::FrameCrcMismatch { consumed, .. }
                | RctError::InvalidCommand { consumed, .. }
                | RctError::FrameLength { consumed, .. }),
            ) => {
                // the next frame may already be in this chunk
                self.pending.extend_from_slice(&input[consumed..]);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        debug!("Frame consumed {} bytes", consumed);
        if !frame.complete() {
            return Ok(None);
        }
        if input.len() > consumed {
            warn!(
                "Frame complete, but buffer still contains {} bytes",
                input.len() - consumed
            );
            debug!("Leftover bytes: {}", hex(&input[consumed..]));
            self.pending.extend_from_slice(&input[consumed..]);
        }
        Ok(Some(std::mem::take(frame)))
    }

    /// Read the current value of an object
    #[instrument(skip(self, info), fields(name = info.name))]
    pub fn read_value(&mut self, info: &ObjectInfo) -> Result<Value> {
        let request = SendFrame::new(Command::Read, info.object_id, [])?;
        self.send(&request)?;

        let response = self.receive()?;
        debug!("Got frame: {}", response);

        if response.id() != info.object_id {
            return Err(RctError::unexpected_response(format!(
                "ID is 0x{:08X}, expected 0x{:08X}",
                response.id(),
                info.object_id
            )));
        }
        if !response.command().is_some_and(Command::is_response) {
            return Err(RctError::unexpected_response(format!(
                "expected a response frame, got {:?}",
                response.command()
            )));
        }

        decode_value(info.response_data_type, response.data())
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
