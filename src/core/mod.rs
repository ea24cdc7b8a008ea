//! Core functionality of the RCT client
//!
//! Contains the protocol types, frame codec, value codecs, the object
//! registry, the device client and the simulator.

pub mod client;
pub mod frame;
pub mod registry;
pub mod simulator;
pub mod types;
pub mod value;

pub use client::RctClient;
pub use frame::{ReceiveFrame, SendFrame};
pub use registry::{ObjectInfo, REGISTRY, Registry};
pub use simulator::Simulator;
pub use types::{Command, DataType, ObjectGroup};
pub use value::{Value, decode_value, encode_value};
