//! Payload values
//!
//! Decodes frame payloads into typed values and encodes them back. All
//! multi-byte quantities are big-endian, timestamps are Unix seconds.

use crate::{
    core::types::DataType,
    error::{RctError, Result},
};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

const TIME_SERIES_PAIR: usize = 8;
const EVENT_ENTRY: usize = 20;

/// A decoded payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Enum(u8),
    Float(f32),
    String(String),
    TimeSeries(TimeSeries),
    EventTable(EventTable),
    /// Payload of an object whose type is not known
    Unknown(Vec<u8>),
}

/// Logged samples, keyed by sample time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Time the series was requested for
    pub timestamp: DateTime<Utc>,
    pub points: BTreeMap<DateTime<Utc>, f32>,
}

/// One event of the device event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntry {
    pub entry_type: char,
    pub timestamp: DateTime<Utc>,
    pub element2: u32,
    pub element3: u32,
    pub element4: u32,
}

/// Device event log, keyed by event time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTable {
    pub timestamp: DateTime<Utc>,
    pub entries: BTreeMap<DateTime<Utc>, EventEntry>,
}

impl Value {
    /// Data type this value encodes as
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Uint8(_) => DataType::Uint8,
            Self::Int8(_) => DataType::Int8,
            Self::Uint16(_) => DataType::Uint16,
            Self::Int16(_) => DataType::Int16,
            Self::Uint32(_) => DataType::Uint32,
            Self::Int32(_) => DataType::Int32,
            Self::Enum(_) => DataType::Enum,
            Self::Float(_) => DataType::Float,
            Self::String(_) => DataType::String,
            Self::TimeSeries(_) => DataType::TimeSeries,
            Self::EventTable(_) => DataType::EventTable,
            Self::Unknown(_) => DataType::Unknown,
        }
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Uint8(v) | Self::Enum(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Uint16(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::TimeSeries(series) => {
                write!(f, "{}", format_time(&series.timestamp))?;
                for (time, value) in &series.points {
                    write!(f, "\n{} {value}", format_time(time))?;
                }
                Ok(())
            }
            Self::EventTable(table) => {
                write!(f, "{}", format_time(&table.timestamp))?;
                for entry in table.entries.values() {
                    write!(
                        f,
                        "\n{} {} 0x{:08X} 0x{:08X} 0x{:08X}",
                        format_time(&entry.timestamp),
                        entry.entry_type,
                        entry.element2,
                        entry.element3,
                        entry.element4
                    )?;
                }
                Ok(())
            }
            Self::Unknown(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Convert Unix seconds to a UTC timestamp
#[must_use]
pub fn timestamp_from_secs(secs: u32) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(i64::from(secs))
}

fn timestamp_to_secs(data_type: DataType, time: &DateTime<Utc>) -> Result<u32> {
    u32::try_from(time.timestamp()).map_err(|_| {
        RctError::encode(
            data_type,
            format!("timestamp {} does not fit 32 bits", format_time(time)),
        )
    })
}

fn take<const N: usize>(data: &[u8], offset: usize, data_type: DataType) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            RctError::decode(
                data_type,
                format!(
                    "need {N} bytes at offset {offset}, payload has {}",
                    data.len()
                ),
            )
        })
}

fn take_u32(data: &[u8], offset: usize, data_type: DataType) -> Result<u32> {
    take::<4>(data, offset, data_type).map(u32::from_be_bytes)
}

/// Decode `data` as a value of `data_type`
pub fn decode_value(data_type: DataType, data: &[u8]) -> Result<Value> {
    let value = match data_type {
        DataType::Bool => Value::Bool(take::<1>(data, 0, data_type)?[0] != 0),
        DataType::Uint8 => Value::Uint8(u8::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Int8 => Value::Int8(i8::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Enum => Value::Enum(u8::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Uint16 => Value::Uint16(u16::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Int16 => Value::Int16(i16::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Uint32 => Value::Uint32(u32::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Int32 => Value::Int32(i32::from_be_bytes(take(data, 0, data_type)?)),
        DataType::Float => Value::Float(f32::from_be_bytes(take(data, 0, data_type)?)),
        DataType::String => {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            Value::String(String::from_utf8_lossy(&data[..end]).into_owned())
        }
        DataType::TimeSeries => Value::TimeSeries(decode_time_series(data)?),
        DataType::EventTable => Value::EventTable(decode_event_table(data)?),
        DataType::Unknown => Value::Unknown(data.to_vec()),
    };
    Ok(value)
}

fn decode_time_series(data: &[u8]) -> Result<TimeSeries> {
    let data_type = DataType::TimeSeries;
    let timestamp = timestamp_from_secs(take_u32(data, 0, data_type)?);

    let points = data[4..]
        .chunks_exact(TIME_SERIES_PAIR)
        .map(|pair| {
            let time = take_u32(pair, 0, data_type)?;
            let value = f32::from_be_bytes(take(pair, 4, data_type)?);
            Ok((timestamp_from_secs(time), value))
        })
        .collect::<Result<_>>()?;

    Ok(TimeSeries { timestamp, points })
}

fn decode_event_table(data: &[u8]) -> Result<EventTable> {
    let data_type = DataType::EventTable;
    let timestamp = timestamp_from_secs(take_u32(data, 0, data_type)?);

    let mut entries = BTreeMap::new();
    for chunk in data[4..].chunks_exact(EVENT_ENTRY) {
        // the type is a single ASCII letter in the low byte
        let entry_type = char::from(take::<4>(chunk, 0, data_type)?[3]);
        let entry = EventEntry {
            entry_type,
            timestamp: timestamp_from_secs(take_u32(chunk, 4, data_type)?),
            element2: take_u32(chunk, 8, data_type)?,
            element3: take_u32(chunk, 12, data_type)?,
            element4: take_u32(chunk, 16, data_type)?,
        };
        entries.insert(entry.timestamp, entry);
    }

    Ok(EventTable { timestamp, entries })
}

/// Encode `value` as a payload of `data_type`
pub fn encode_value(data_type: DataType, value: &Value) -> Result<Vec<u8>> {
    if value.data_type() != data_type {
        return Err(RctError::encode(
            data_type,
            format!("cannot encode a {} value", value.data_type()),
        ));
    }

    let bytes = match value {
        Value::Bool(v) => vec![u8::from(*v)],
        Value::Uint8(v) | Value::Enum(v) => vec![*v],
        Value::Int8(v) => v.to_be_bytes().to_vec(),
        Value::Uint16(v) => v.to_be_bytes().to_vec(),
        Value::Int16(v) => v.to_be_bytes().to_vec(),
        Value::Uint32(v) => v.to_be_bytes().to_vec(),
        Value::Int32(v) => v.to_be_bytes().to_vec(),
        Value::Float(v) => v.to_be_bytes().to_vec(),
        Value::String(v) => v.as_bytes().to_vec(),
        Value::TimeSeries(series) => {
            let mut out = Vec::with_capacity(4 + series.points.len() * TIME_SERIES_PAIR);
            out.extend(timestamp_to_secs(data_type, &series.timestamp)?.to_be_bytes());
            for (time, value) in &series.points {
                out.extend(timestamp_to_secs(data_type, time)?.to_be_bytes());
                out.extend(value.to_be_bytes());
            }
            out
        }
        Value::EventTable(table) => {
            let mut out = Vec::with_capacity(4 + table.entries.len() * EVENT_ENTRY);
            out.extend(timestamp_to_secs(data_type, &table.timestamp)?.to_be_bytes());
            for entry in table.entries.values() {
                let entry_type = u8::try_from(entry.entry_type).map_err(|_| {
                    RctError::encode(
                        data_type,
                        format!("event type '{}' is not a single byte", entry.entry_type),
                    )
                })?;
                out.extend(u32::from(entry_type).to_be_bytes());
                out.extend(timestamp_to_secs(data_type, &entry.timestamp)?.to_be_bytes());
                out.extend(entry.element2.to_be_bytes());
                out.extend(entry.element3.to_be_bytes());
                out.extend(entry.element4.to_be_bytes());
            }
            out
        }
        Value::Unknown(bytes) => bytes.clone(),
    };
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_value(DataType::Bool, &[0x01]).unwrap(), Value::Bool(true));
        assert_eq!(decode_value(DataType::Bool, &[0x00]).unwrap(), Value::Bool(false));
        assert_eq!(decode_value(DataType::Int8, &[0xFF]).unwrap(), Value::Int8(-1));
        assert_eq!(
            decode_value(DataType::Uint16, &[0x12, 0x34]).unwrap(),
            Value::Uint16(0x1234)
        );
        assert_eq!(
            decode_value(DataType::Int32, &[0xFF, 0xFF, 0xFF, 0xFE]).unwrap(),
            Value::Int32(-2)
        );
        assert_eq!(
            decode_value(DataType::Float, &[0x3F, 0x00, 0x00, 0x00]).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_decode_short_payload_fails() {
        let err = decode_value(DataType::Float, &[0x3F, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            RctError::Decode {
                data_type: DataType::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_string_stops_at_nul() {
        let value = decode_value(DataType::String, b"PS 6.0 HV\0\0garbage").unwrap();
        assert_eq!(value, Value::String("PS 6.0 HV".to_string()));
    }

    #[test]
    fn test_decode_time_series() {
        let mut data = vec![];
        data.extend(1_600_000_000u32.to_be_bytes());
        data.extend(1_600_000_300u32.to_be_bytes());
        data.extend(12.5f32.to_be_bytes());
        data.extend(1_600_000_000u32.to_be_bytes());
        data.extend(10.0f32.to_be_bytes());
        // trailing partial pair is ignored
        data.extend([0x00, 0x01]);

        let Value::TimeSeries(series) = decode_value(DataType::TimeSeries, &data).unwrap() else {
            panic!("Expected time series");
        };
        assert_eq!(series.timestamp, timestamp_from_secs(1_600_000_000));
        let points: Vec<_> = series.points.into_iter().collect();
        assert_eq!(
            points,
            vec![
                (timestamp_from_secs(1_600_000_000), 10.0),
                (timestamp_from_secs(1_600_000_300), 12.5),
            ]
        );
    }

    #[test]
    fn test_decode_event_table() {
        let mut data = vec![];
        data.extend(1_600_000_000u32.to_be_bytes());
        data.extend(u32::from(b'E').to_be_bytes());
        data.extend(1_599_999_000u32.to_be_bytes());
        data.extend(7u32.to_be_bytes());
        data.extend(8u32.to_be_bytes());
        data.extend(9u32.to_be_bytes());

        let Value::EventTable(table) = decode_value(DataType::EventTable, &data).unwrap() else {
            panic!("Expected event table");
        };
        let entry = &table.entries[&timestamp_from_secs(1_599_999_000)];
        assert_eq!(entry.entry_type, 'E');
        assert_eq!((entry.element2, entry.element3, entry.element4), (7, 8, 9));
    }

    #[test]
    fn test_encode_matches_decode() {
        let table = Value::EventTable(EventTable {
            timestamp: timestamp_from_secs(100),
            entries: BTreeMap::from([(
                timestamp_from_secs(50),
                EventEntry {
                    entry_type: 'W',
                    timestamp: timestamp_from_secs(50),
                    element2: 1,
                    element3: 2,
                    element4: 3,
                },
            )]),
        });
        let bytes = encode_value(DataType::EventTable, &table).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_value(DataType::EventTable, &bytes).unwrap(), table);
    }

    #[test]
    fn test_encode_rejects_mismatched_type() {
        let err = encode_value(DataType::Float, &Value::Uint8(1)).unwrap_err();
        assert!(err.to_string().contains("cannot encode a UINT8 value"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Unknown(vec![0xDE, 0xAD]).to_string(), "dead");

        let series = Value::TimeSeries(TimeSeries {
            timestamp: timestamp_from_secs(0),
            points: BTreeMap::from([(timestamp_from_secs(60), 1.5)]),
        });
        assert_eq!(
            series.to_string(),
            "1970-01-01T00:00:00Z\n1970-01-01T00:01:00Z 1.5"
        );
    }
}
