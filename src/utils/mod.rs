//! Utility modules for common functionality
//!
//! Provides the frame checksum and environment handling.

pub mod crc;
pub mod env;

pub use crc::crc16;
pub use env::EnvUtils;
