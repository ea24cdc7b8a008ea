//! Error types for the RCT client
//!
//! Provides structured error handling with context and proper error chains.

use crate::core::types::DataType;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the RCT client
#[derive(Error, Debug)]
pub enum RctError {
    /// A complete frame was received but its checksum did not match
    #[error("Frame CRC mismatch: received 0x{received:04X} but calculated 0x{calculated:04X}")]
    FrameCrcMismatch {
        received: u16,
        calculated: u16,
        /// Bytes of the input consumed up to and including the bad frame
        consumed: usize,
    },

    /// The command byte of a frame is not a known command
    #[error("Invalid command byte 0x{command:02X}")]
    InvalidCommand { command: u8, consumed: usize },

    /// A frame length field is out of range
    #[error("Invalid frame length {length}: {message}")]
    FrameLength {
        length: usize,
        message: String,
        /// Bytes of the input consumed up to and including the bad length
        /// field, zero when encoding
        consumed: usize,
    },

    /// No registry entry for the requested ID or name
    #[error("Unknown object: {query}")]
    UnknownObject { query: String },

    /// Object ID could not be parsed
    #[error("Invalid object ID '{input}': expected a hexadecimal value such as 0x959930BF")]
    InvalidObjectId { input: String },

    /// Payload could not be decoded as the expected data type
    #[error("Decoding error for {data_type}: {message}")]
    Decode { data_type: DataType, message: String },

    /// Value could not be encoded as the requested data type
    #[error("Encoding error for {data_type}: {message}")]
    Encode { data_type: DataType, message: String },

    /// Network errors while talking to a device or serving clients
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// No complete frame arrived in time
    #[error("Timed out after {}s waiting for a response", .after.as_secs_f32())]
    Timeout { after: Duration },

    /// A frame arrived but does not answer the request
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl RctError {
    /// Create a new frame length error
    pub fn frame_length(length: usize, message: impl Into<String>) -> Self {
        Self::FrameLength {
            length,
            message: message.into(),
            consumed: 0,
        }
    }

    /// Create a new unknown object error
    pub fn unknown_object(query: impl Into<String>) -> Self {
        Self::UnknownObject {
            query: query.into(),
        }
    }

    /// Create a new decoding error
    pub fn decode(data_type: DataType, message: impl Into<String>) -> Self {
        Self::Decode {
            data_type,
            message: message.into(),
        }
    }

    /// Create a new encoding error
    pub fn encode(data_type: DataType, message: impl Into<String>) -> Self {
        Self::Encode {
            data_type,
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connection {
            message: message.into(),
            source,
        }
    }

    /// Create a new unexpected response error
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RctError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_mismatch_message() {
        let err = RctError::FrameCrcMismatch {
            received: 0x1234,
            calculated: 0xABCD,
            consumed: 9,
        };
        assert_eq!(
            err.to_string(),
            "Frame CRC mismatch: received 0x1234 but calculated 0xABCD"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = RctError::Timeout {
            after: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "Timed out after 2s waiting for a response");
    }

    #[test]
    fn test_connection_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RctError::connection("Could not connect to 10.0.0.1:8899", io);
        assert!(err.to_string().contains("10.0.0.1:8899"));
        assert!(err.source().is_some());
    }
}
