//! Host-side adapters: USB-serial ports standing in for the board UART and
//! modem control signals standing in for GPIO lines.

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serialport::{SerialPort, SerialPortInfo};
use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::hal::{Level, LinkConfig, OutputLine, Transport};
use crate::{Error, Result};

const READ_TIMEOUT_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, serial_number, manufacturer, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.serial_number.clone(),
                usb.manufacturer.clone(),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            serial_number,
            manufacturer,
            product,
        }
    }
}

pub fn list_ports() -> Vec<PortInfo> {
    serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect()
}

#[derive(Debug, Clone)]
enum SerialEvent {
    Rx(Vec<u8>),
    Error(String),
    Closed,
}

enum Command {
    Close,
}

struct Session {
    port_name: String,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
    reader: Option<JoinHandle<()>>,
}

/// UART emulation over host serial ports.
///
/// Each `(rx, tx)` pin pair is routed to one port path, so swapping the pin
/// variant swaps the adapter being listened to.
pub struct SerialTransport {
    routes: HashMap<(u8, u8), String>,
    session: Option<Session>,
    pending: VecDeque<u8>,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            session: None,
            pending: VecDeque::new(),
        }
    }

    pub fn route(mut self, rx_pin: u8, tx_pin: u8, port_name: impl Into<String>) -> Self {
        self.routes.insert((rx_pin, tx_pin), port_name.into());
        self
    }

    fn spawn_reader(port_name: &str, mut port: Box<dyn SerialPort>) -> Session {
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();

        let reader = std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match port.read(&mut buf) {
                    Ok(n) if n > 0 => {
                        let _ = tx_evt.send(SerialEvent::Rx(buf[..n].to_vec()));
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        let _ = tx_evt.send(SerialEvent::Error(e.to_string()));
                        std::thread::sleep(Duration::from_millis(READ_TIMEOUT_MS));
                    }
                }
                if let Ok(Command::Close) = rx_cmd.try_recv() {
                    let _ = tx_evt.send(SerialEvent::Closed);
                    return;
                }
            }
        });

        Session {
            port_name: port_name.to_string(),
            tx_cmd,
            rx_evt,
            reader: Some(reader),
        }
    }

    fn pump(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        while let Ok(event) = session.rx_evt.try_recv() {
            match event {
                SerialEvent::Rx(data) => self.pending.extend(data),
                SerialEvent::Error(e) => warn!("{}: {e}", session.port_name),
                SerialEvent::Closed => debug!("{} reader stopped", session.port_name),
            }
        }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialTransport {
    fn begin(&mut self, link: LinkConfig) -> Result<()> {
        self.end();

        let port_name = self
            .routes
            .get(&(link.rx_pin, link.tx_pin))
            .ok_or(Error::UnroutedPins { rx: link.rx_pin, tx: link.tx_pin })?
            .clone();

        let port = serialport::new(&port_name, link.baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(|source| Error::Open { port: port_name.clone(), source })?;

        info!("{port_name} open @{} 8N1 (rx={} tx={})", link.baud, link.rx_pin, link.tx_pin);
        self.session = Some(Self::spawn_reader(&port_name, port));
        Ok(())
    }

    fn end(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let _ = session.tx_cmd.send(Command::Close);
        // The port must be released before the same path can be reopened.
        if let Some(reader) = session.reader.take() {
            if reader.join().is_err() {
                warn!("{} reader thread panicked", session.port_name);
            }
        }
        self.pending.clear();
        debug!("{} closed", session.port_name);
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.pump();
        }
        self.pending.pop_front()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.end();
    }
}

/// Modem signal of a USB-serial adapter used as a GPIO substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemSignal {
    Dtr,
    Rts,
    Break,
}

pub type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Open the adapter whose modem signals drive the control lines.
pub fn open_control_port(port_name: &str) -> Result<SharedPort> {
    let port = serialport::new(port_name, 9_600)
        .timeout(Duration::from_millis(READ_TIMEOUT_MS))
        .open()
        .map_err(|source| Error::Open { port: port_name.to_string(), source })?;
    info!("control lines on {port_name}");
    Ok(Arc::new(Mutex::new(port)))
}

pub struct ModemLine {
    port: SharedPort,
    signal: ModemSignal,
    invert: bool,
}

impl ModemLine {
    /// `invert` compensates for adapters that drive DTR/RTS active-low.
    pub fn new(port: SharedPort, signal: ModemSignal, invert: bool) -> Self {
        Self { port, signal, invert }
    }
}

impl OutputLine for ModemLine {
    fn drive(&mut self, level: Level) -> Result<()> {
        let asserted = level.is_high() != self.invert;
        let mut port = self.port.lock();
        match self.signal {
            ModemSignal::Dtr => port.write_data_terminal_ready(asserted)?,
            ModemSignal::Rts => port.write_request_to_send(asserted)?,
            ModemSignal::Break if asserted => port.set_break()?,
            ModemSignal::Break => port.clear_break()?,
        }
        Ok(())
    }
}

/// Line that is not wired anywhere; drives are only logged.
pub struct NullLine {
    name: &'static str,
}

impl NullLine {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl OutputLine for NullLine {
    fn drive(&mut self, level: Level) -> Result<()> {
        debug!("{} -> {level} (unwired)", self.name);
        Ok(())
    }
}
