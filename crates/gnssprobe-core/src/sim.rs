//! Simulated board parts for tests and NMEA log replay.

use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::hal::{Clock, Level, LinkConfig, OutputLine, Transport};
use crate::Result;

/// Clock that only moves when told to.
///
/// With a non-zero `auto_step` every `millis()` read advances time, which lets
/// busy-wait loops terminate.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    auto_step: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_step(step_ms: u64) -> Self {
        Self { now: Arc::default(), auto_step: step_ms }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    /// Handle on the same time that never auto-steps, for parts that only
    /// look at the clock.
    pub fn observer(&self) -> Self {
        Self { now: self.now.clone(), auto_step: 0 }
    }

    /// Current time without the auto step.
    pub fn peek(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn millis(&self) -> u64 {
        self.now.fetch_add(self.auto_step, Ordering::SeqCst)
    }

    fn delay_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

/// Output line that records every drive with its timestamp.
#[derive(Clone)]
pub struct RecordingLine {
    clock: ManualClock,
    events: Arc<Mutex<Vec<(u64, Level)>>>,
}

impl RecordingLine {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, events: Arc::default() }
    }

    pub fn events(&self) -> Vec<(u64, Level)> {
        self.events.lock().clone()
    }

    pub fn levels(&self) -> Vec<Level> {
        self.events.lock().iter().map(|&(_, level)| level).collect()
    }
}

impl OutputLine for RecordingLine {
    fn drive(&mut self, level: Level) -> Result<()> {
        self.events.lock().push((self.clock.peek(), level));
        Ok(())
    }
}

/// Transport fed from a pre-built schedule of `(due_ms, byte)` pairs.
///
/// Bytes become readable once the clock reaches their due time. When an
/// accepted link is set, sessions on any other link hear nothing and bytes
/// falling due during them are lost, like a receiver talking on pins nobody
/// is listening to.
pub struct ScriptedTransport<C: Clock> {
    clock: C,
    schedule: VecDeque<(u64, u8)>,
    accepts: Option<LinkConfig>,
    link: Option<LinkConfig>,
    sessions: Arc<Mutex<Vec<LinkConfig>>>,
}

impl<C: Clock> ScriptedTransport<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            schedule: VecDeque::new(),
            accepts: None,
            link: None,
            sessions: Arc::default(),
        }
    }

    /// Only deliver bytes while a session on `link` is open.
    pub fn accepting(mut self, link: LinkConfig) -> Self {
        self.accepts = Some(link);
        self
    }

    /// Queue `bytes` to arrive at `due_ms`.
    pub fn push_at(&mut self, due_ms: u64, bytes: &[u8]) {
        self.schedule.extend(bytes.iter().map(|&b| (due_ms, b)));
    }

    /// Queue one line of `text` every `interval_ms`, starting at `start_ms`.
    pub fn push_lines(&mut self, text: &str, start_ms: u64, interval_ms: u64) {
        for (i, line) in text.lines().enumerate() {
            let due = start_ms + i as u64 * interval_ms;
            self.push_at(due, line.as_bytes());
            self.push_at(due, b"\r\n");
        }
    }

    /// Shared log of every `begin` call, in order.
    pub fn sessions(&self) -> Arc<Mutex<Vec<LinkConfig>>> {
        self.sessions.clone()
    }

    pub fn remaining(&self) -> usize {
        self.schedule.len()
    }

    fn listening(&self) -> bool {
        match (self.link, self.accepts) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(open), Some(wanted)) => open == wanted,
        }
    }
}

impl<C: Clock> Transport for ScriptedTransport<C> {
    fn begin(&mut self, link: LinkConfig) -> Result<()> {
        self.link = Some(link);
        self.sessions.lock().push(link);
        Ok(())
    }

    fn end(&mut self) {
        self.link = None;
    }

    fn read_byte(&mut self) -> Option<u8> {
        let now = self.clock.millis();
        let listening = self.listening();
        while let Some(&(due, byte)) = self.schedule.front() {
            if due > now {
                break;
            }
            self.schedule.pop_front();
            if listening {
                return Some(byte);
            }
            debug!("byte 0x{byte:02X} dropped, nobody listening");
        }
        None
    }
}
