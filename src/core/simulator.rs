//! Device simulator
//!
//! Answers read requests with plausible values so that clients can be tested
//! without an inverter. Each client is served on its own thread.

use crate::{
    config::SimulatorConfig,
    core::{
        client::hex,
        frame::{ReceiveFrame, SendFrame},
        registry::{ObjectInfo, REGISTRY},
        types::DataType,
        value::{EventTable, TimeSeries, Value, encode_value},
    },
    error::{RctError, Result},
};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    io::{ErrorKind, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};
use tracing::{debug, error, info, instrument, warn};

/// Values written by clients, shared across connections
type WrittenValues = Arc<Mutex<HashMap<u32, Vec<u8>>>>;

/// Simulated inverter listening on a TCP socket
#[derive(Debug)]
pub struct Simulator {
    listener: TcpListener,
    max_clients: usize,
    active: Arc<AtomicUsize>,
    written: WrittenValues,
}

/// Decrements the active client count when a client thread ends
struct ClientSlot(Arc<AtomicUsize>);

impl Drop for ClientSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Simulator {
    /// Bind to the configured address
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub fn bind(config: &SimulatorConfig) -> Result<Self> {
        let address = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&address)
            .map_err(|e| RctError::connection(format!("Failed to bind to {address}"), e))?;

        Ok(Self {
            listener,
            max_clients: config.max_clients,
            active: Arc::new(AtomicUsize::new(0)),
            written: Arc::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RctError::connection("Failed to get local address", e))
    }

    /// Accept clients until the listener fails
    pub fn serve(&self) -> Result<()> {
        info!("Simulator listening on {}", self.local_addr()?);

        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(RctError::connection("Failed to accept connection", e)),
            };

            if self.active.fetch_add(1, Ordering::SeqCst) >= self.max_clients {
                self.active.fetch_sub(1, Ordering::SeqCst);
                warn!(
                    "Rejecting {}: already serving {} clients",
                    peer, self.max_clients
                );
                drop(stream);
                continue;
            }

            info!("Client connected: {}", peer);
            let slot = ClientSlot(Arc::clone(&self.active));
            let written = Arc::clone(&self.written);
            thread::spawn(move || {
                let _slot = slot;
                match handle_client(stream, &written) {
                    Ok(()) => info!("Client disconnected: {}", peer),
                    Err(e) => error!("Client {} failed: {}", peer, e),
                }
            });
        }
    }
}

fn handle_client(mut stream: TcpStream, written: &WrittenValues) -> Result<()> {
    let mut frame = ReceiveFrame::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RctError::connection("Failed to receive", e)),
        };
        debug!("Received {} bytes: {}", n, hex(&buf[..n]));

        let mut input = &buf[..n];
        while !input.is_empty() {
            let consumed = match frame.consume(input) {
                Ok(consumed) => consumed,
                Err(
                    e @ (RctError::FrameCrcMismatch { consumed, .. }
                    | RctError::InvalidCommand { consumed, .. }
                    | RctError::FrameLength { consumed, .. }),
                ) => {
                    warn!("Dropping frame: {}", e);
                    frame = ReceiveFrame::new();
                    input = &input[consumed..];
                    continue;
                }
                Err(e) => return Err(e),
            };
            input = &input[consumed..];

            if frame.complete() {
                let request = std::mem::take(&mut frame);
                if let Some(reply) = respond(&request, written)? {
                    stream
                        .write_all(reply.data())
                        .map_err(|e| RctError::connection("Failed to send response", e))?;
                }
            }
        }
    }
}

/// Build the answer to a request, if it warrants one
fn respond(request: &ReceiveFrame, written: &WrittenValues) -> Result<Option<SendFrame>> {
    let Some(command) = request.command() else {
        return Ok(None);
    };
    debug!("Request: {}", request);

    let info = match REGISTRY.get_by_id(request.id()) {
        Ok(info) => info,
        Err(e) => {
            warn!("Ignoring request: {}", e);
            return Ok(None);
        }
    };

    let payload = if command.is_read() {
        let stored = written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&info.object_id)
            .cloned();
        match stored {
            Some(payload) => payload,
            None => encode_value(info.response_data_type, &sim_value(info))?,
        }
    } else if command.is_write() {
        info!("Storing value for {}", info.name);
        let payload = request.data().to_vec();
        written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.object_id, payload.clone());
        payload
    } else {
        debug!("Ignoring {} frame for {}", command, info.name);
        return Ok(None);
    };

    let response = command.response_for(payload.len());
    let frame = if command.is_plant() {
        SendFrame::plant(response, info.object_id, request.address(), payload)?
    } else {
        SendFrame::new(response, info.object_id, payload)?
    };
    Ok(Some(frame))
}

/// Value the simulator reports for an object that was never written
#[must_use]
pub fn sim_value(info: &ObjectInfo) -> Value {
    if let Some(value) = &info.sim_data {
        if value.data_type() == info.response_data_type {
            return value.clone();
        }
    }
    default_value(info.response_data_type)
}

fn default_value(data_type: DataType) -> Value {
    match data_type {
        DataType::Bool => Value::Bool(false),
        DataType::Uint8 => Value::Uint8(0),
        DataType::Int8 => Value::Int8(0),
        DataType::Uint16 => Value::Uint16(0),
        DataType::Int16 => Value::Int16(0),
        DataType::Uint32 => Value::Uint32(0),
        DataType::Int32 => Value::Int32(0),
        DataType::Enum => Value::Enum(0),
        DataType::Float => Value::Float(0.0),
        DataType::String => Value::String("ABCDEFG".to_string()),
        DataType::TimeSeries => Value::TimeSeries(TimeSeries {
            timestamp: now(),
            points: BTreeMap::new(),
        }),
        DataType::EventTable => Value::EventTable(EventTable {
            timestamp: now(),
            entries: BTreeMap::new(),
        }),
        DataType::Unknown => Value::Unknown(Vec::new()),
    }
}

fn now() -> chrono::DateTime<Utc> {
    use chrono::SubsecRound;
    Utc::now().trunc_subsecs(0)
}
