//! The position display program: one-shot setup, then `tick` forever.

use gnssprobe_nmea::NmeaParser;
use log::{debug, info, warn};
use std::io::Write;

use crate::board::{Board, PinVariant, NMEA_BAUD_RATE};
use crate::bringup::gnss_power_on;
use crate::hal::{Align, Clock, Display, LinkConfig};
use crate::ingest::{AntennaStatus, SentenceIngest};
use crate::render::DisplayRenderer;
use crate::Result;

/// State that lives for the whole run of the display program.
pub struct DisplayContext {
    pub parser: NmeaParser,
    pub antenna: AntennaStatus,
    ingest: SentenceIngest,
    renderer: DisplayRenderer,
    link: LinkConfig,
}

impl DisplayContext {
    pub fn new() -> Self {
        Self::with_link(PinVariant::A.link(NMEA_BAUD_RATE))
    }

    pub fn with_link(link: LinkConfig) -> Self {
        Self {
            parser: NmeaParser::new(),
            antenna: AntennaStatus::default(),
            ingest: SentenceIngest::new(),
            renderer: DisplayRenderer::new(),
            link,
        }
    }

    /// Splash screen, module power-up and UART start.
    pub fn setup<C: Clock, D: Display + ?Sized, W: Write>(
        &mut self,
        board: &mut Board<C>,
        display: &mut D,
        console: &mut W,
    ) -> Result<()> {
        writeln!(console, "Program started. Setting up...")?;

        display.clear();
        display.draw_string(0, 0, Align::Left, "Initializing ...");
        display.flush();

        gnss_power_on(board);

        if let Err(e) = board.transport.begin(self.link) {
            warn!("GNSS UART: {e}");
        }
        writeln!(console, "GNSS UART started @{}", self.link.baud)?;
        Ok(())
    }

    /// One pass of the main loop: drain input, redraw if due.
    pub fn tick<C: Clock, D: Display + ?Sized, W: Write>(
        &mut self,
        board: &mut Board<C>,
        display: &mut D,
        console: &mut W,
    ) -> Result<bool> {
        let read = self.ingest.poll(
            board.transport.as_mut(),
            &board.clock,
            &mut self.parser,
            &mut self.antenna,
        );
        if read > 0 {
            debug!(
                "{read} bytes, checksums ok/bad {}/{}",
                self.parser.passed_checksum(),
                self.parser.failed_checksum()
            );
        }

        let was_searching = !self.has_fix();
        let now = board.clock.millis();
        let drawn = self
            .renderer
            .render(self.parser.fix_mut(), &self.antenna, display, console, now)?;
        if drawn && was_searching && self.has_fix() {
            info!("first fix data after {} ms", now);
        }
        Ok(drawn)
    }

    fn has_fix(&self) -> bool {
        let fix = self.parser.fix();
        fix.time.is_valid() || fix.location.is_valid()
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self::new()
    }
}
