//! Brute-force bring-up sweep: every power/wake/pin/baud combination gets a
//! capture window whose bytes are dumped for a human to read. Nothing here
//! decides which combination worked.

use log::{info, warn};
use serde::Serialize;
use std::io::Write;

use crate::board::{
    Board, PinVariant, CAPTURE_WINDOW_MS, SWEEP_BAUD_RATES, UART_SETTLE_MS, UART_TEARDOWN_MS,
};
use crate::bringup::{pulse_reset, set_power, set_wake};
use crate::hal::{Clock, Level, LinkConfig};
use crate::hexdump::render_byte;
use crate::Result;

const COMBO_RULE: &str = "--------------------------------";
const GROUP_RULE: &str = "================================================================";

/// One trial of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestCombination {
    pub power: Level,
    pub wake: Level,
    pub variant: PinVariant,
    pub baud: u32,
}

impl TestCombination {
    pub fn link(&self) -> LinkConfig {
        self.variant.link(self.baud)
    }
}

/// Outcome of one capture window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureResult {
    pub bytes: u32,
    pub started_at: u64,
    pub ended_at: u64,
}

impl CaptureResult {
    pub fn duration_ms(&self) -> u64 {
        self.ended_at - self.started_at
    }
}

/// Levels, variants and rates to sweep, in iteration order.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub levels: [Level; 2],
    pub variants: [PinVariant; 2],
    pub bauds: [u32; 3],
    pub window_ms: u64,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            levels: [Level::Low, Level::High],
            variants: PinVariant::ALL,
            bauds: SWEEP_BAUD_RATES,
            window_ms: CAPTURE_WINDOW_MS,
        }
    }
}

impl SweepPlan {
    /// Power outermost, then wake, then pin variant, baud innermost.
    pub fn combinations(&self) -> impl Iterator<Item = TestCombination> + '_ {
        self.levels.iter().flat_map(move |&power| {
            self.levels.iter().flat_map(move |&wake| {
                self.variants.iter().flat_map(move |&variant| {
                    self.bauds
                        .iter()
                        .map(move |&baud| TestCombination { power, wake, variant, baud })
                })
            })
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    #[serde(flatten)]
    pub combination: TestCombination,
    pub rx_pin: u8,
    pub tx_pin: u8,
    pub bytes: u32,
}

/// Byte counts of a finished sweep, for saving alongside the console log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub trials: Vec<TrialRecord>,
}

/// Read and dump everything arriving within `window_ms`.
///
/// Busy-polls the transport until the deadline so that bytes are rendered
/// as soon as they arrive.
pub fn capture_for<C: Clock, W: Write>(
    board: &mut Board<C>,
    out: &mut W,
    window_ms: u64,
) -> Result<CaptureResult> {
    let started_at = board.clock.millis();
    let deadline = started_at + window_ms;
    let mut bytes = 0u32;

    let ended_at = loop {
        let now = board.clock.millis();
        if now >= deadline {
            break now;
        }
        while let Some(b) = board.transport.read_byte() {
            bytes += 1;
            out.write_all(render_byte(b).as_bytes())?;
        }
        std::hint::spin_loop();
    };

    writeln!(out)?;
    writeln!(out, "bytes read: {bytes}")?;
    Ok(CaptureResult { bytes, started_at, ended_at })
}

/// Reopen the UART on `link` and capture one window.
pub fn try_combo<C: Clock, W: Write>(
    board: &mut Board<C>,
    out: &mut W,
    label: &str,
    link: LinkConfig,
    window_ms: u64,
) -> Result<CaptureResult> {
    writeln!(out, "{COMBO_RULE}")?;
    writeln!(out, "{label}  rx={} tx={} baud={}", link.rx_pin, link.tx_pin, link.baud)?;

    board.transport.end();
    board.clock.delay_ms(UART_TEARDOWN_MS);
    if let Err(e) = board.transport.begin(link) {
        warn!("{label} @{}: {e}", link.baud);
    }
    board.clock.delay_ms(UART_SETTLE_MS);

    capture_for(board, out, window_ms)
}

/// Run the whole sweep once and print `DONE`.
pub fn run_sweep<C: Clock, W: Write>(
    board: &mut Board<C>,
    out: &mut W,
    plan: &SweepPlan,
) -> Result<SweepReport> {
    writeln!(out, "GNSS bring-up debug")?;

    let mut report = SweepReport::default();
    let mut group: Option<(Level, Level)> = None;

    for combo in plan.combinations() {
        if group != Some((combo.power, combo.wake)) {
            group = Some((combo.power, combo.wake));
            for _ in 0..3 {
                writeln!(out, "{GROUP_RULE}")?;
            }
            writeln!(out, "POWER={}  WAKE={}", combo.power, combo.wake)?;
            info!("power={} wake={}", combo.power, combo.wake);

            set_power(board, combo.power);
            set_wake(board, combo.wake);
            pulse_reset(board);
        }

        let link = combo.link();
        let capture = try_combo(board, out, combo.variant.label(), link, plan.window_ms)?;
        report.trials.push(TrialRecord {
            combination: combo,
            rx_pin: link.rx_pin,
            tx_pin: link.tx_pin,
            bytes: capture.bytes,
        });
    }

    board.transport.end();
    writeln!(out, "DONE")?;
    out.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bringup::tests::rig;
    use crate::hal::Transport;
    use crate::sim::{ManualClock, ScriptedTransport};
    use crate::Error;

    const RMC: &[u8] = b"$GPRMC,,V,,,,,,,,,,N*53\r\n";

    #[test]
    fn plan_order_and_size() {
        let combos: Vec<_> = SweepPlan::default().combinations().collect();
        assert_eq!(combos.len(), 24);
        assert_eq!(
            combos[0],
            TestCombination { power: Level::Low, wake: Level::Low, variant: PinVariant::A, baud: 9_600 }
        );
        assert_eq!(combos[3].variant, PinVariant::B);
        assert_eq!(combos[5].baud, 115_200);
        assert_eq!(combos[6].wake, Level::High);
        assert_eq!(combos[12].power, Level::High);
        assert_eq!(combos[23].variant, PinVariant::B);
    }

    #[test]
    fn capture_window_is_fixed_length() {
        for payload in [&b""[..], RMC] {
            let clock = ManualClock::with_auto_step(1);
            let (_, lines) = rig(clock.clone());
            let mut transport = ScriptedTransport::new(clock.observer());
            transport.push_at(10, payload);
            transport.begin(PinVariant::A.link(9_600)).unwrap();
            let mut board = Board::new(clock, lines, Box::new(transport));

            let mut out = Vec::new();
            let result = capture_for(&mut board, &mut out, CAPTURE_WINDOW_MS).unwrap();
            assert_eq!(result.duration_ms(), CAPTURE_WINDOW_MS);
            assert_eq!(result.bytes as usize, payload.len());

            let text = String::from_utf8(out).unwrap();
            assert!(text.ends_with(&format!("\nbytes read: {}\n", payload.len())));
        }
    }

    #[test]
    fn capture_dumps_hex_and_ascii() {
        let clock = ManualClock::with_auto_step(1);
        let (_, lines) = rig(clock.clone());
        let mut transport = ScriptedTransport::new(clock.observer());
        transport.push_at(0, &[b'$', b'G', 0x0D]);
        transport.begin(PinVariant::A.link(9_600)).unwrap();
        let mut board = Board::new(clock, lines, Box::new(transport));

        let mut out = Vec::new();
        capture_for(&mut board, &mut out, 100).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "24 $ 47 G 0D . \nbytes read: 3\n");
    }

    #[test]
    fn full_sweep_runs_every_window_in_order() {
        let clock = ManualClock::with_auto_step(1);
        let (rig, lines) = rig(clock.clone());
        let good = PinVariant::A.link(9_600);
        let mut transport = ScriptedTransport::new(clock.observer()).accepting(good);
        // A receiver that chatters once a second for the whole sweep.
        for second in 0..600 {
            transport.push_at(second * 1_000, RMC);
        }
        let sessions = transport.sessions();
        let mut board = Board::new(clock, lines, Box::new(transport));

        let plan = SweepPlan { window_ms: 3_000, ..SweepPlan::default() };
        let mut out = Vec::new();
        let report = run_sweep(&mut board, &mut out, &plan).unwrap();

        let sessions = sessions.lock().clone();
        assert_eq!(sessions.len(), 24);
        let expected: Vec<LinkConfig> = plan.combinations().map(|c| c.link()).collect();
        assert_eq!(sessions, expected);
        assert_eq!(sessions[..6], sessions[18..]);

        assert_eq!(report.trials.len(), 24);
        for trial in &report.trials {
            let heard = trial.combination.link() == good;
            assert_eq!(trial.bytes > 0, heard, "{:?}", trial.combination);
        }

        assert_eq!(rig.power.levels(), vec![Level::Low, Level::Low, Level::High, Level::High]);
        assert_eq!(rig.wake.levels(), vec![Level::Low, Level::High, Level::Low, Level::High]);
        assert_eq!(rig.reset.levels().len(), 8);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("GNSS bring-up debug\n"));
        assert!(text.ends_with("DONE\n"));
        assert_eq!(text.matches("bytes read: ").count(), 24);
        assert_eq!(text.matches("POWER=").count(), 4);
        assert!(text.contains("POWER=HIGH  WAKE=LOW\n"));
        assert!(text.contains("PinsB  rx=38 tx=39 baud=115200\n"));
    }

    /// Transport whose port never opens.
    struct DeadTransport;

    impl Transport for DeadTransport {
        fn begin(&mut self, link: LinkConfig) -> crate::Result<()> {
            Err(Error::UnroutedPins { rx: link.rx_pin, tx: link.tx_pin })
        }

        fn end(&mut self) {}

        fn read_byte(&mut self) -> Option<u8> {
            None
        }
    }

    #[test]
    fn failed_open_still_captures_a_full_window() {
        let clock = ManualClock::with_auto_step(1);
        let (_, lines) = rig(clock.clone());
        let mut board = Board::new(clock, lines, Box::new(DeadTransport));

        let mut out = Vec::new();
        let link = PinVariant::B.link(38_400);
        let result = try_combo(&mut board, &mut out, "PinsB", link, CAPTURE_WINDOW_MS).unwrap();
        assert_eq!(result.bytes, 0);
        assert_eq!(result.duration_ms(), CAPTURE_WINDOW_MS);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{COMBO_RULE}\nPinsB  rx=38 tx=39 baud=38400\n\nbytes read: 0\n"));
    }
}
