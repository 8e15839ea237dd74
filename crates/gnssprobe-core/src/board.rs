use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hal::{Clock, LinkConfig, OutputLine, Transport};

/// GPIO numbers of the GNSS module on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub power: u8,
    pub wake: u8,
    pub reset: u8,
    /// Pulse-per-second input. Wired but not read.
    pub pps: u8,
}

pub const GNSS_PINS: BoardPins = BoardPins {
    power: 34,
    wake: 40,
    reset: 42,
    pps: 41,
};

/// The two candidate UART wirings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinVariant {
    A,
    B,
}

impl PinVariant {
    pub const ALL: [PinVariant; 2] = [PinVariant::A, PinVariant::B];

    pub fn label(self) -> &'static str {
        match self {
            PinVariant::A => "PinsA",
            PinVariant::B => "PinsB",
        }
    }

    /// `(rx, tx)` as seen from the board.
    pub fn pins(self) -> (u8, u8) {
        match self {
            PinVariant::A => (39, 38),
            PinVariant::B => (38, 39),
        }
    }

    pub fn link(self, baud: u32) -> LinkConfig {
        let (rx_pin, tx_pin) = self.pins();
        LinkConfig { rx_pin, tx_pin, baud }
    }
}

impl fmt::Display for PinVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rates tried per pin variant, slowest first.
pub const SWEEP_BAUD_RATES: [u32; 3] = [9_600, 38_400, 115_200];

/// Rate of the receiver's factory NMEA output.
pub const NMEA_BAUD_RATE: u32 = 9_600;

// Settling delays (ms)
pub const RESET_LOW_MS: u64 = 80;
pub const RESET_RECOVER_MS: u64 = 500;
pub const WAKE_SETTLE_MS: u64 = 200;
pub const POWER_SETTLE_MS: u64 = 300;
pub const UART_TEARDOWN_MS: u64 = 50;
pub const UART_SETTLE_MS: u64 = 200;
pub const CAPTURE_WINDOW_MS: u64 = 3_000;

/// The three control lines of the GNSS module.
pub struct ControlLines {
    pub power: Box<dyn OutputLine>,
    pub wake: Box<dyn OutputLine>,
    pub reset: Box<dyn OutputLine>,
}

/// Everything the programs touch: clock, control lines and the UART.
pub struct Board<C: Clock> {
    pub clock: C,
    pub lines: ControlLines,
    pub transport: Box<dyn Transport>,
}

impl<C: Clock> Board<C> {
    pub fn new(clock: C, lines: ControlLines, transport: Box<dyn Transport>) -> Self {
        Self { clock, lines, transport }
    }
}
