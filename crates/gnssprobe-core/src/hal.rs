//! Board-facing traits: output lines, clock, serial transport, display.

use serde::Serialize;
use std::fmt;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Low => "LOW",
            Level::High => "HIGH",
        })
    }
}

/// A digital line the probe drives (power enable, wake, reset).
pub trait OutputLine {
    /// Switch the line to output mode and drive `level`.
    fn drive(&mut self, level: Level) -> Result<()>;
}

/// Monotonic millisecond clock with a blocking delay.
pub trait Clock {
    fn millis(&self) -> u64;
    fn delay_ms(&self, ms: u64);
}

/// Pin assignment and rate for one transport session. Framing is always 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkConfig {
    pub rx_pin: u8,
    pub tx_pin: u8,
    pub baud: u32,
}

/// Byte transport to the receiver.
pub trait Transport {
    /// Start a session. Any previous session must have been ended.
    fn begin(&mut self, link: LinkConfig) -> Result<()>;

    /// Tear down the current session, if any.
    fn end(&mut self);

    /// Non-blocking read of one buffered byte.
    fn read_byte(&mut self) -> Option<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Small bitmap-text display. Drawing calls build a frame that only becomes
/// visible on [`Display::flush`].
pub trait Display {
    fn clear(&mut self);
    fn draw_string(&mut self, x: i32, y: i32, align: Align, text: &str);
    fn draw_progress_bar(&mut self, x: i32, y: i32, width: i32, height: i32, percent: u8);
    fn flush(&mut self);
}
