//! Protocol enumerations
//!
//! Command bytes, payload data types and object groups.

use crate::error::RctError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame command byte
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Read = 0x01,
    Write = 0x02,
    LongWrite = 0x03,
    Reserved1 = 0x04,
    Response = 0x05,
    LongResponse = 0x06,
    Reserved2 = 0x07,
    ReadPeriodically = 0x08,
    Extension = 0x3C,
    PlantRead = 0x41,
    PlantWrite = 0x42,
    PlantLongWrite = 0x43,
    PlantResponse = 0x45,
    PlantLongResponse = 0x46,
}

impl Command {
    /// Long commands use a two byte length field
    #[must_use]
    pub const fn is_long(self) -> bool {
        matches!(
            self,
            Self::LongWrite | Self::LongResponse | Self::PlantLongWrite | Self::PlantLongResponse
        )
    }

    /// Plant commands carry a device address in front of the object ID
    #[must_use]
    pub const fn is_plant(self) -> bool {
        matches!(
            self,
            Self::PlantRead
                | Self::PlantWrite
                | Self::PlantLongWrite
                | Self::PlantResponse
                | Self::PlantLongResponse
        )
    }

    #[must_use]
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            Self::Response | Self::LongResponse | Self::PlantResponse | Self::PlantLongResponse
        )
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::Write | Self::LongWrite | Self::PlantWrite | Self::PlantLongWrite
        )
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadPeriodically | Self::PlantRead)
    }

    /// Response command answering `self` with a payload of `payload_len` bytes
    #[must_use]
    pub const fn response_for(self, payload_len: usize) -> Self {
        let header = if self.is_plant() { 8 } else { 4 };
        let long = payload_len + header > u8::MAX as usize;
        match (self.is_plant(), long) {
            (false, false) => Self::Response,
            (false, true) => Self::LongResponse,
            (true, false) => Self::PlantResponse,
            (true, true) => Self::PlantLongResponse,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = RctError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::Read,
            0x02 => Self::Write,
            0x03 => Self::LongWrite,
            0x04 => Self::Reserved1,
            0x05 => Self::Response,
            0x06 => Self::LongResponse,
            0x07 => Self::Reserved2,
            0x08 => Self::ReadPeriodically,
            0x3C => Self::Extension,
            0x41 => Self::PlantRead,
            0x42 => Self::PlantWrite,
            0x43 => Self::PlantLongWrite,
            0x45 => Self::PlantResponse,
            0x46 => Self::PlantLongResponse,
            other => {
                return Err(RctError::InvalidCommand {
                    command: other,
                    consumed: 0,
                });
            }
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::LongWrite => "LONG_WRITE",
            Self::Reserved1 => "RESERVED1",
            Self::Response => "RESPONSE",
            Self::LongResponse => "LONG_RESPONSE",
            Self::Reserved2 => "RESERVED2",
            Self::ReadPeriodically => "READ_PERIODICALLY",
            Self::Extension => "EXTENSION",
            Self::PlantRead => "PLANT_READ",
            Self::PlantWrite => "PLANT_WRITE",
            Self::PlantLongWrite => "PLANT_LONG_WRITE",
            Self::PlantResponse => "PLANT_RESPONSE",
            Self::PlantLongResponse => "PLANT_LONG_RESPONSE",
        };
        f.write_str(name)
    }
}

/// Data type of an object's payload
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Unknown = 0,
    Bool = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Uint32 = 6,
    Int32 = 7,
    Enum = 8,
    Float = 9,
    String = 10,
    TimeSeries = 20,
    EventTable = 21,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Bool => "BOOL",
            Self::Uint8 => "UINT8",
            Self::Int8 => "INT8",
            Self::Uint16 => "UINT16",
            Self::Int16 => "INT16",
            Self::Uint32 => "UINT32",
            Self::Int32 => "INT32",
            Self::Enum => "ENUM",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::TimeSeries => "TIMESERIES",
            Self::EventTable => "EVENT_TABLE",
        };
        f.write_str(name)
    }
}

/// Logical group an object belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectGroup {
    Battery,
    DcConv,
    Db,
    Energy,
    Fault,
    GSync,
    GridPll,
    Logger,
    Other,
    PowerMng,
    PrimSm,
    Temperature,
    Wifi,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_byte() {
        assert_eq!(Command::try_from(0x01).unwrap(), Command::Read);
        assert_eq!(Command::try_from(0x46).unwrap(), Command::PlantLongResponse);
        assert!(matches!(
            Command::try_from(0x44),
            Err(RctError::InvalidCommand { command: 0x44, .. })
        ));
    }

    #[test]
    fn test_command_classification() {
        assert!(Command::LongResponse.is_long());
        assert!(!Command::Response.is_long());
        assert!(Command::PlantRead.is_plant());
        assert!(!Command::ReadPeriodically.is_plant());
        assert!(Command::PlantResponse.is_response());
        assert!(Command::PlantLongWrite.is_write());
    }

    #[test]
    fn test_response_for() {
        assert_eq!(Command::Read.response_for(4), Command::Response);
        assert_eq!(Command::Read.response_for(251), Command::Response);
        assert_eq!(Command::Read.response_for(252), Command::LongResponse);
        assert_eq!(Command::PlantRead.response_for(4), Command::PlantResponse);
        assert_eq!(Command::PlantRead.response_for(248), Command::PlantLongResponse);
        assert_eq!(Command::PlantRead.response_for(600), Command::PlantLongResponse);
    }
}
