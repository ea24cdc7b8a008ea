//! Frame encoding and decoding
//!
//! A frame on the wire looks like this, all fields big-endian:
//!
//! ```text
//! '+' | command (1) | length (1 or 2) | [address (4)] | id (4) | payload | crc16 (2)
//! ```
//!
//! Long commands use a two byte length, plant commands carry an address. The
//! length counts address, id and payload. After the start token every `+` or
//! `-` byte is escaped by a preceding `-`.

use crate::{
    core::types::Command,
    error::{RctError, Result},
    utils::crc::crc16,
};
use std::fmt;
use tracing::debug;

/// Marks the beginning of a frame
pub const START_TOKEN: u8 = b'+';
/// Prefix for escaped bytes
pub const ESCAPE_TOKEN: u8 = b'-';

const ID_LENGTH: usize = 4;
const ADDRESS_LENGTH: usize = 4;
const CRC_LENGTH: usize = 2;

const fn length_field_size(command: Command) -> usize {
    if command.is_long() { 2 } else { 1 }
}

const fn min_length(command: Command) -> usize {
    if command.is_plant() {
        ADDRESS_LENGTH + ID_LENGTH
    } else {
        ID_LENGTH
    }
}

/// A frame ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFrame {
    command: Command,
    id: u32,
    address: u32,
    payload: Vec<u8>,
    data: Vec<u8>,
}

impl SendFrame {
    /// Build a standard frame
    pub fn new(command: Command, id: u32, payload: impl Into<Vec<u8>>) -> Result<Self> {
        Self::build(command, id, 0, payload.into())
    }

    /// Build a frame addressed to a device inside a plant. `command` must be
    /// a plant command.
    pub fn plant(
        command: Command,
        id: u32,
        address: u32,
        payload: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        Self::build(command, id, address, payload.into())
    }

    fn build(command: Command, id: u32, address: u32, payload: Vec<u8>) -> Result<Self> {
        let length = min_length(command) + payload.len();
        let max = if command.is_long() {
            usize::from(u16::MAX)
        } else {
            usize::from(u8::MAX)
        };
        if length > max {
            return Err(RctError::frame_length(
                length,
                format!("{command} frames hold at most {max} bytes"),
            ));
        }

        let mut raw = Vec::with_capacity(1 + 2 + length + CRC_LENGTH);
        raw.push(command as u8);
        if command.is_long() {
            // bounds checked above
            raw.extend((length as u16).to_be_bytes());
        } else {
            raw.push(length as u8);
        }
        if command.is_plant() {
            raw.extend(address.to_be_bytes());
        }
        raw.extend(id.to_be_bytes());
        raw.extend(&payload);
        let crc = crc16(&raw);
        raw.extend(crc.to_be_bytes());

        let mut data = Vec::with_capacity(raw.len() * 2);
        data.push(START_TOKEN);
        for byte in raw {
            if byte == START_TOKEN || byte == ESCAPE_TOKEN {
                data.push(ESCAPE_TOKEN);
            }
            data.push(byte);
        }

        Ok(Self {
            command,
            id,
            address,
            payload,
            data,
        })
    }

    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn address(&self) -> u32 {
        self.address
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encoded bytes, ready for the wire
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Incremental frame parser
///
/// Feed received bytes to [`ReceiveFrame::consume`] until
/// [`ReceiveFrame::complete`] returns true.
#[derive(Debug, Default, Clone)]
pub struct ReceiveFrame {
    started: bool,
    escaping: bool,
    complete: bool,
    /// Unescaped bytes following the start token
    buffer: Vec<u8>,
    command: Option<Command>,
    /// Total unescaped size once the length field is known
    expected: Option<usize>,
    address: u32,
    id: u32,
    crc16: u16,
}

impl ReceiveFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume bytes, returning how many were used
    ///
    /// Parsing stops at the end of a complete frame; any remaining input is
    /// left to the caller. Errors report the consumed count so the caller can
    /// resynchronise on the rest of the input.
    pub fn consume(&mut self, input: &[u8]) -> Result<usize> {
        for (i, &byte) in input.iter().enumerate() {
            if self.complete {
                return Ok(i);
            }
            let consumed = i + 1;

            if !self.started {
                if byte == START_TOKEN {
                    self.started = true;
                }
                continue;
            }

            if self.escaping {
                self.escaping = false;
            } else if byte == ESCAPE_TOKEN {
                self.escaping = true;
                continue;
            } else if byte == START_TOKEN {
                debug!("Start token inside frame, restarting");
                *self = Self {
                    started: true,
                    ..Self::default()
                };
                continue;
            }

            self.buffer.push(byte);
            self.advance(consumed)?;
            if self.complete {
                return Ok(consumed);
            }
        }
        Ok(input.len())
    }

    fn advance(&mut self, consumed: usize) -> Result<()> {
        let len = self.buffer.len();

        let Some(command) = self.command else {
            let command = Command::try_from(self.buffer[0]).map_err(|_| {
                RctError::InvalidCommand {
                    command: self.buffer[0],
                    consumed,
                }
            })?;
            self.command = Some(command);
            return Ok(());
        };

        let header = 1 + length_field_size(command);
        if len == header {
            let length = if command.is_long() {
                usize::from(u16::from_be_bytes([self.buffer[1], self.buffer[2]]))
            } else {
                usize::from(self.buffer[1])
            };
            if length < min_length(command) {
                return Err(RctError::FrameLength {
                    length,
                    message: format!(
                        "{command} frames need at least {} bytes",
                        min_length(command)
                    ),
                    consumed,
                });
            }
            self.expected = Some(header + length + CRC_LENGTH);
            return Ok(());
        }

        if self.expected != Some(len) {
            return Ok(());
        }

        let crc_start = len - CRC_LENGTH;
        let received = u16::from_be_bytes([self.buffer[crc_start], self.buffer[crc_start + 1]]);
        let calculated = crc16(&self.buffer[..crc_start]);
        if received != calculated {
            return Err(RctError::FrameCrcMismatch {
                received,
                calculated,
                consumed,
            });
        }

        let mut offset = header;
        if command.is_plant() {
            self.address = read_u32(&self.buffer, offset);
            offset += ADDRESS_LENGTH;
        }
        self.id = read_u32(&self.buffer, offset);
        self.crc16 = received;
        self.complete = true;
        Ok(())
    }

    /// Whether a whole frame has been received
    #[must_use]
    pub const fn complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub const fn command(&self) -> Option<Command> {
        self.command
    }

    /// Object ID, valid once complete
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Plant address, zero for standard frames
    #[must_use]
    pub const fn address(&self) -> u32 {
        self.address
    }

    #[must_use]
    pub const fn crc16(&self) -> u16 {
        self.crc16
    }

    /// Payload, empty until the frame is complete
    #[must_use]
    pub fn data(&self) -> &[u8] {
        let Some(command) = self.command.filter(|_| self.complete) else {
            return &[];
        };
        let start = 1 + length_field_size(command) + min_length(command);
        &self.buffer[start..self.buffer.len() - CRC_LENGTH]
    }
}

fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ])
}

impl fmt::Display for ReceiveFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command {
            Some(command) if self.complete => {
                write!(f, "<ReceiveFrame(cmd={command}, id=0x{:08X}", self.id)?;
                if command.is_plant() {
                    write!(f, ", address=0x{:08X}", self.address)?;
                }
                write!(
                    f,
                    ", crc=0x{:04X}, data_length={})>",
                    self.crc16,
                    self.data().len()
                )
            }
            _ => write!(f, "<ReceiveFrame(incomplete, {} bytes)>", self.buffer.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_bytes() {
        let frame = SendFrame::new(Command::Read, 0x959930BF, []).unwrap();
        assert_eq!(
            frame.data(),
            &[0x2B, 0x01, 0x04, 0x95, 0x99, 0x30, 0xBF, 0x0D, 0x65]
        );
    }

    #[test]
    fn test_consume_parses_response() {
        let payload = 0.5f32.to_be_bytes();
        let sent = SendFrame::new(Command::Response, 0x959930BF, payload).unwrap();

        let mut frame = ReceiveFrame::new();
        let consumed = frame.consume(sent.data()).unwrap();

        assert_eq!(consumed, sent.data().len());
        assert!(frame.complete());
        assert_eq!(frame.command(), Some(Command::Response));
        assert_eq!(frame.id(), 0x959930BF);
        assert_eq!(frame.data(), &payload);
    }

    #[test]
    fn test_special_bytes_are_escaped() {
        let sent = SendFrame::new(Command::Write, 0x2B2D2B2D, [b'+', b'-']).unwrap();
        let body = &sent.data()[1..];

        // every special byte after the start token is preceded by an escape
        let mut iter = body.iter();
        while let Some(&byte) = iter.next() {
            assert_ne!(byte, START_TOKEN);
            if byte == ESCAPE_TOKEN {
                let next = iter.next().copied();
                assert!(matches!(next, Some(START_TOKEN | ESCAPE_TOKEN)));
            }
        }

        let mut frame = ReceiveFrame::new();
        frame.consume(sent.data()).unwrap();
        assert_eq!(frame.id(), 0x2B2D2B2D);
        assert_eq!(frame.data(), b"+-");
    }

    #[test]
    fn test_consume_byte_by_byte() {
        let sent = SendFrame::new(Command::Response, 0x7924ABD9, *b"serial").unwrap();
        let mut frame = ReceiveFrame::new();
        for chunk in sent.data().chunks(1) {
            assert_eq!(frame.consume(chunk).unwrap(), 1);
        }
        assert!(frame.complete());
        assert_eq!(frame.data(), b"serial");
    }

    #[test]
    fn test_leading_garbage_is_skipped_and_leftover_kept() {
        let sent = SendFrame::new(Command::Response, 0x1C4A665F, 50.0f32.to_be_bytes()).unwrap();
        let mut input = vec![0x00, 0xFF];
        input.extend(sent.data());
        input.extend([0xAA, 0xBB]);

        let mut frame = ReceiveFrame::new();
        let consumed = frame.consume(&input).unwrap();
        assert!(frame.complete());
        assert_eq!(consumed, input.len() - 2);
        assert_eq!(frame.consume(&[0x2B]).unwrap(), 0);
    }

    #[test]
    fn test_start_token_inside_frame_restarts() {
        let sent = SendFrame::new(Command::Response, 0x959930BF, 0.5f32.to_be_bytes()).unwrap();
        let mut input = vec![START_TOKEN, Command::Response as u8, 0x08];
        input.extend(sent.data());

        let mut frame = ReceiveFrame::new();
        frame.consume(&input).unwrap();
        assert!(frame.complete());
        assert_eq!(frame.id(), 0x959930BF);
    }

    #[test]
    fn test_long_and_plant_frames() {
        let payload = vec![0x11; 300];
        let sent =
            SendFrame::plant(Command::PlantLongResponse, 0xDB2D69AE, 0xCAFE0001, payload.clone())
                .unwrap();

        let mut frame = ReceiveFrame::new();
        frame.consume(sent.data()).unwrap();
        assert!(frame.complete());
        assert_eq!(frame.command(), Some(Command::PlantLongResponse));
        assert_eq!(frame.address(), 0xCAFE0001);
        assert_eq!(frame.id(), 0xDB2D69AE);
        assert_eq!(frame.data(), payload.as_slice());
    }

    #[test]
    fn test_payload_too_large_for_short_frame() {
        let err = SendFrame::new(Command::Write, 1, vec![0; 252]).unwrap_err();
        assert!(matches!(err, RctError::FrameLength { length: 256, .. }));
        assert!(SendFrame::new(Command::LongWrite, 1, vec![0; 252]).is_ok());
    }

    #[test]
    fn test_crc_mismatch() {
        let sent = SendFrame::new(Command::Response, 0x959930BF, 0.5f32.to_be_bytes()).unwrap();
        let mut data = sent.data().to_vec();
        let last = data.len() - 1;
        data[last] ^= 0x01;

        let err = ReceiveFrame::new().consume(&data).unwrap_err();
        match err {
            RctError::FrameCrcMismatch {
                received,
                calculated,
                consumed,
            } => {
                assert_ne!(received, calculated);
                assert_eq!(consumed, data.len());
            }
            other => panic!("Expected CRC mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_command() {
        let err = ReceiveFrame::new().consume(&[0x00, START_TOKEN, 0x44]).unwrap_err();
        assert!(matches!(
            err,
            RctError::InvalidCommand {
                command: 0x44,
                consumed: 3
            }
        ));
    }

    #[test]
    fn test_length_too_short() {
        let err = ReceiveFrame::new()
            .consume(&[START_TOKEN, Command::Response as u8, 0x02])
            .unwrap_err();
        assert!(matches!(
            err,
            RctError::FrameLength {
                length: 2,
                consumed: 3,
                ..
            }
        ));
    }
}
