//! Screen layout of the position display.

use gnssprobe_nmea::PositionFix;
use std::io::Write;

use crate::hal::{Align, Display};
use crate::ingest::AntennaStatus;
use crate::Result;

/// Redraw at least this often even without new data (ms).
pub const UI_REFRESH_MS: u64 = 1_000;

const RIGHT_EDGE: i32 = 127;
const FOOTER_Y: i32 = 54;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Searching,
    Locked,
}

/// Searching animation: `(tick / 5) % 100`. Purely cosmetic.
pub fn search_progress(tick: u32) -> u8 {
    ((tick / 5) % 100) as u8
}

#[derive(Debug, Default)]
pub struct DisplayRenderer {
    last_ui: u64,
    search_tick: u32,
}

impl DisplayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_redraw(&self, gps_updated: bool, now: u64) -> bool {
        gps_updated || now.saturating_sub(self.last_ui) >= UI_REFRESH_MS
    }

    pub fn state(fix: &PositionFix) -> ScreenState {
        if fix.time.is_valid() || fix.location.is_valid() {
            ScreenState::Locked
        } else {
            ScreenState::Searching
        }
    }

    /// Redraw when due. Returns whether a frame was flushed.
    ///
    /// In the locked state the three text lines are also written to `console`.
    pub fn render<D: Display + ?Sized, W: Write>(
        &mut self,
        fix: &mut PositionFix,
        antenna: &AntennaStatus,
        display: &mut D,
        console: &mut W,
        now: u64,
    ) -> Result<bool> {
        let gps_updated = fix.location.is_updated() || fix.time.is_updated();
        if !self.should_redraw(gps_updated, now) {
            return Ok(false);
        }
        self.last_ui = now;

        display.clear();

        match Self::state(fix) {
            ScreenState::Searching => {
                let progress = search_progress(self.search_tick);
                self.search_tick = self.search_tick.wrapping_add(1);

                display.draw_string(0, 10, Align::Left, "Searching GPS ...");
                display.draw_progress_bar(0, 32, 120, 10, progress);
            }
            ScreenState::Locked => {
                let [time, lat, lon] = locked_lines(fix);
                for line in [&time, &lat, &lon] {
                    writeln!(console, "{line}")?;
                }
                display.draw_string(0, 0, Align::Left, &time);
                display.draw_string(0, 12, Align::Left, &lat);
                display.draw_string(0, 24, Align::Left, &lon);
            }
        }

        if let Some(badge) = antenna.badge(now) {
            display.draw_string(RIGHT_EDGE, 0, Align::Right, badge);
        }
        display.draw_string(RIGHT_EDGE, FOOTER_Y, Align::Right, &format!("{}s", now / 1_000));

        display.flush();
        Ok(true)
    }
}

fn locked_lines(fix: &mut PositionFix) -> [String; 3] {
    let time = match fix.time.read() {
        Some(t) => format!("{:02}:{:02}:{:02}.{:02}", t.hour, t.minute, t.second, t.centisecond),
        None => "--:--:--.--".to_string(),
    };
    let (lat, lon) = match fix.location.read() {
        Some(loc) => (format!("LAT: {:.6}", loc.lat), format!("LON: {:.6}", loc.lng)),
        None => ("LAT: ----".to_string(), "LON: ----".to_string()),
    };
    [time, lat, lon]
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text { x: i32, y: i32, align: Align, text: String },
    ProgressBar { x: i32, y: i32, width: i32, height: i32, percent: u8 },
}

/// Display that keeps the pending and last flushed frame as draw lists.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<DrawOp>,
    shown: Vec<DrawOp>,
    flushes: u32,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame currently visible.
    pub fn shown(&self) -> &[DrawOp] {
        &self.shown
    }

    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    pub fn texts(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::ProgressBar { .. } => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Option<u8> {
        self.shown.iter().find_map(|op| match op {
            DrawOp::ProgressBar { percent, .. } => Some(*percent),
            DrawOp::Text { .. } => None,
        })
    }
}

impl Display for FrameBuffer {
    fn clear(&mut self) {
        self.pending.clear();
    }

    fn draw_string(&mut self, x: i32, y: i32, align: Align, text: &str) {
        self.pending.push(DrawOp::Text { x, y, align, text: text.to_string() });
    }

    fn draw_progress_bar(&mut self, x: i32, y: i32, width: i32, height: i32, percent: u8) {
        self.pending.push(DrawOp::ProgressBar { x, y, width, height, percent: percent.min(100) });
    }

    fn flush(&mut self) {
        self.shown = self.pending.clone();
        self.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnssprobe_nmea::NmeaParser;

    fn parser_with(sentences: &[&str]) -> NmeaParser {
        let mut parser = NmeaParser::new();
        for s in sentences {
            for b in s.bytes() {
                parser.encode(b);
            }
        }
        parser
    }

    #[test]
    fn progress_cycles_below_one_hundred() {
        assert_eq!(search_progress(0), 0);
        assert_eq!(search_progress(4), 0);
        assert_eq!(search_progress(5), 1);
        assert_eq!(search_progress(499), 99);
        assert_eq!(search_progress(500), 0);
        assert!((0..5_000).map(search_progress).all(|p| p < 100));
        assert!(search_progress(u32::MAX) < 100);
    }

    #[test]
    fn redraw_only_when_due() {
        let mut renderer = DisplayRenderer::new();
        let mut fix = PositionFix::default();
        let antenna = AntennaStatus::default();
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        assert!(!renderer.render(&mut fix, &antenna, &mut display, &mut console, 999).unwrap());
        assert!(renderer.render(&mut fix, &antenna, &mut display, &mut console, 1_000).unwrap());
        assert!(!renderer.render(&mut fix, &antenna, &mut display, &mut console, 1_500).unwrap());
        assert!(renderer.render(&mut fix, &antenna, &mut display, &mut console, 2_000).unwrap());
        assert_eq!(display.flushes(), 2);
    }

    #[test]
    fn new_fix_forces_redraw() {
        let mut parser = parser_with(&["$GNRMC,081836.25,V,,,,,,,130998,,*08\r\n"]);
        let mut renderer = DisplayRenderer::new();
        let antenna = AntennaStatus::default();
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        assert!(renderer.render(parser.fix_mut(), &antenna, &mut display, &mut console, 10).unwrap());
        // The update flag was consumed by the redraw.
        assert!(!renderer.render(parser.fix_mut(), &antenna, &mut display, &mut console, 20).unwrap());
    }

    #[test]
    fn antenna_ok_shown_from_boot() {
        let mut renderer = DisplayRenderer::new();
        let mut fix = PositionFix::default();
        let antenna = AntennaStatus::default();
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        renderer.render(&mut fix, &antenna, &mut display, &mut console, 1_000).unwrap();
        assert_eq!(display.texts(), vec!["Searching GPS ...", "ANT OK", "1s"]);
    }

    #[test]
    fn searching_screen() {
        let mut renderer = DisplayRenderer::new();
        let mut fix = PositionFix::default();
        let antenna = AntennaStatus::default();
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        for i in 1..=6 {
            renderer.render(&mut fix, &antenna, &mut display, &mut console, i * 1_000).unwrap();
        }
        assert_eq!(display.texts(), vec!["Searching GPS ...", "6s"]);
        assert_eq!(display.progress(), Some(1));
        assert!(console.is_empty());
    }

    #[test]
    fn locked_screen_with_time_only() {
        let mut parser = parser_with(&["$GNRMC,081836.25,V,,,,,,,130998,,*08\r\n"]);
        let mut renderer = DisplayRenderer::new();
        let mut antenna = AntennaStatus::default();
        antenna.observe_line(b"$GPTXT,01,01,01,ANTENNA OK*35\r\n", 0);
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        renderer.render(parser.fix_mut(), &antenna, &mut display, &mut console, 4_200).unwrap();
        assert_eq!(
            display.texts(),
            vec!["08:18:36.25", "LAT: ----", "LON: ----", "ANT OK", "4s"]
        );
        assert_eq!(display.progress(), None);
        assert_eq!(String::from_utf8(console).unwrap(), "08:18:36.25\nLAT: ----\nLON: ----\n");
    }

    #[test]
    fn locked_screen_with_position() {
        let mut parser = parser_with(&[
            "$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*44\r\n",
        ]);
        let mut renderer = DisplayRenderer::new();
        let mut antenna = AntennaStatus::default();
        antenna.observe_line(b"ANTENNA OPEN\n", 0);
        let mut display = FrameBuffer::new();
        let mut console = Vec::new();

        renderer.render(parser.fix_mut(), &antenna, &mut display, &mut console, 5_000).unwrap();
        let texts = display.texts();
        assert_eq!(texts[0], "12:35:19.00");
        assert_eq!(texts[1], "LAT: 48.117300");
        assert_eq!(texts[2], "LON: 11.516667");
        // Antenna report is exactly five seconds old: no badge.
        assert_eq!(texts[3], "5s");
        assert_eq!(texts.len(), 4);

        let footer = display.shown().last().unwrap();
        assert_eq!(
            footer,
            &DrawOp::Text { x: 127, y: 54, align: Align::Right, text: "5s".to_string() }
        );
    }
}
