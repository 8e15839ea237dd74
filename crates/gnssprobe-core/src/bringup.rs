//! Power, wake and reset sequencing of the GNSS module.

use log::{info, warn};

use crate::board::{
    Board, POWER_SETTLE_MS, RESET_LOW_MS, RESET_RECOVER_MS, WAKE_SETTLE_MS,
};
use crate::hal::{Clock, Level, OutputLine};

/// Level of the power-enable line that switches the module on (active low).
pub const POWER_ON: Level = Level::Low;

const BOOT_HOLD_MS: u64 = 200;
const BOOT_RESET_LOW_MS: u64 = 50;

fn drive(line: &mut dyn OutputLine, name: &str, level: Level) {
    if let Err(e) = line.drive(level) {
        warn!("{name} -> {level} failed: {e}");
    }
}

/// Pulse reset low, release it and wait for the module to boot.
pub fn pulse_reset<C: Clock>(board: &mut Board<C>) {
    drive(board.lines.reset.as_mut(), "reset", Level::Low);
    board.clock.delay_ms(RESET_LOW_MS);
    drive(board.lines.reset.as_mut(), "reset", Level::High);
    board.clock.delay_ms(RESET_RECOVER_MS);
}

pub fn set_wake<C: Clock>(board: &mut Board<C>, level: Level) {
    drive(board.lines.wake.as_mut(), "wake", level);
    board.clock.delay_ms(WAKE_SETTLE_MS);
}

pub fn set_power<C: Clock>(board: &mut Board<C>, level: Level) {
    drive(board.lines.power.as_mut(), "power", level);
    board.clock.delay_ms(POWER_SETTLE_MS);
}

/// One-shot start-up used by the position display: power on, wake, reset.
///
/// Nothing is verified here; a dead module simply never produces sentences.
pub fn gnss_power_on<C: Clock>(board: &mut Board<C>) {
    drive(board.lines.power.as_mut(), "power", POWER_ON);
    drive(board.lines.wake.as_mut(), "wake", Level::High);
    drive(board.lines.reset.as_mut(), "reset", Level::High);
    board.clock.delay_ms(BOOT_HOLD_MS);

    drive(board.lines.reset.as_mut(), "reset", Level::Low);
    board.clock.delay_ms(BOOT_RESET_LOW_MS);
    drive(board.lines.reset.as_mut(), "reset", Level::High);
    board.clock.delay_ms(RESET_RECOVER_MS);
    info!("GNSS power sequence done");
}
