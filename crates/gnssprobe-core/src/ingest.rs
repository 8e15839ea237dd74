//! Draining the UART into the NMEA parser while sniffing antenna reports.

use gnssprobe_nmea::NmeaParser;
use log::info;

use crate::hal::{Clock, Transport};
use crate::linebuf::{contains, LineBuffer};

const ANTENNA_KEYWORD: &[u8] = b"ANTENNA";
const OPEN_KEYWORD: &[u8] = b"OPEN";

/// How long an antenna report stays on screen (ms).
pub const ANTENNA_BADGE_MS: u64 = 5_000;

/// Last antenna supervisor report (`$GPTXT,...,ANTENNA OK|OPEN`).
///
/// Starts as an `OK` report at boot time, so `ANT OK` shows for the first
/// five seconds even before the receiver says anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AntennaStatus {
    open: bool,
    updated_at: u64,
}

impl AntennaStatus {
    /// Update from a completed line; returns whether the line was a report.
    pub fn observe_line(&mut self, line: &[u8], now: u64) -> bool {
        if !contains(line, ANTENNA_KEYWORD) {
            return false;
        }
        let open = contains(line, OPEN_KEYWORD);
        if open != self.open {
            info!("antenna {}", if open { "open" } else { "ok" });
        }
        self.open = open;
        self.updated_at = now;
        true
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Badge text while the last report is fresh, `None` otherwise.
    pub fn badge(&self, now: u64) -> Option<&'static str> {
        if now.saturating_sub(self.updated_at) >= ANTENNA_BADGE_MS {
            return None;
        }
        Some(if self.open { "ANT OPEN" } else { "ANT OK" })
    }
}

/// Per-iteration byte pump.
#[derive(Default)]
pub struct SentenceIngest {
    line: LineBuffer,
}

impl SentenceIngest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every byte the transport has right now. Returns the byte count.
    pub fn poll<C: Clock>(
        &mut self,
        transport: &mut dyn Transport,
        clock: &C,
        parser: &mut NmeaParser,
        antenna: &mut AntennaStatus,
    ) -> usize {
        let mut count = 0;
        while let Some(byte) = transport.read_byte() {
            count += 1;
            parser.encode(byte);
            self.line.feed(byte, |line| {
                antenna.observe_line(line, clock.millis());
            });
        }
        count
    }
}
