//! Core functionalities: board abstraction, bring-up sweep, NMEA ingest and
//! display rendering, plus host serial adapters and simulated hardware.

pub mod board;
pub mod bringup;
pub mod clock;
pub mod error;
pub mod hal;
pub mod hexdump;
pub mod ingest;
pub mod linebuf;
pub mod position;
pub mod render;
pub mod serial_service;
pub mod sim;
pub mod sweep;

pub use board::{Board, BoardPins, ControlLines, PinVariant, GNSS_PINS};
pub use clock::SystemClock;
pub use error::{Error, Result};
pub use hal::{Align, Clock, Display, Level, LinkConfig, OutputLine, Transport};
pub use position::DisplayContext;
pub use render::{DrawOp, FrameBuffer};
pub use serial_service::{list_ports, ModemLine, ModemSignal, NullLine, PortInfo, SerialTransport};
pub use sweep::{run_sweep, SweepPlan, SweepReport};
