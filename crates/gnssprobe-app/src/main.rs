slint::include_modules!();

mod config;
mod oled;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use gnssprobe_core::sim::ScriptedTransport;
use gnssprobe_core::{
    list_ports, run_sweep, Board, DisplayContext, SweepPlan, SystemClock, Transport, GNSS_PINS,
};
use log::{info, warn};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use config::Config;
use oled::OledWindow;

/// Period of the display main loop.
const LOOP_PERIOD_MS: u64 = 10;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("gnss-probe")
        .about("GNSS receiver bring-up sweep and position display")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Wiring config (JSON); defaults to the user config dir")
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand_required(true)
        .subcommand(Command::new("ports").about("List serial ports"))
        .subcommand(
            Command::new("sweep")
                .about("Try every power/wake/pin/baud combination and dump what arrives")
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help("Also write per-combination byte counts as JSON")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("display")
                .about("Show time, position and antenna status")
                .arg(
                    Arg::new("replay")
                        .long("replay")
                        .help("Play an NMEA log instead of reading the receiver")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("line-interval")
                        .long("line-interval")
                        .help("Milliseconds between replayed lines")
                        .value_parser(value_parser!(u64))
                        .default_value("100"),
                ),
        )
        .get_matches();

    let config_path = matches.get_one::<PathBuf>("config");

    match matches.subcommand() {
        Some(("ports", _)) => {
            print_ports();
            Ok(())
        }
        Some(("sweep", sub)) => run_sweep_command(&Config::load(config_path.map(PathBuf::as_path))?, sub),
        Some(("display", sub)) => run_display(&Config::load(config_path.map(PathBuf::as_path))?, sub),
        _ => unreachable!("subcommand_required"),
    }
}

fn print_ports() {
    for p in list_ports() {
        if let (Some(vid), Some(pid)) = (p.vid, p.pid) {
            println!("{} ({:04X}:{:04X}) {}", p.port_name, vid, pid, p.product.unwrap_or_default());
        } else {
            println!("{} [{}]", p.port_name, p.port_type);
        }
    }
}

fn log_wiring() {
    info!(
        "GNSS pins: power={} wake={} reset={} pps={} (pps not used)",
        GNSS_PINS.power, GNSS_PINS.wake, GNSS_PINS.reset, GNSS_PINS.pps
    );
}

fn run_sweep_command(config: &Config, args: &ArgMatches) -> Result<()> {
    log_wiring();
    let lines = config.control_lines()?;
    let mut board = Board::new(SystemClock::new(), lines, Box::new(config.transport()));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = run_sweep(&mut board, &mut out, &SweepPlan::default())?;

    if let Some(path) = args.get_one::<PathBuf>("report") {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

struct DisplayProgram {
    board: Board<SystemClock>,
    display: OledWindow,
    ctx: DisplayContext,
}

fn run_display(config: &Config, args: &ArgMatches) -> Result<()> {
    log_wiring();
    let app = MainWindow::new()?;
    let clock = SystemClock::new();

    let (lines, transport) = match args.get_one::<PathBuf>("replay") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let interval = *args.get_one::<u64>("line-interval").unwrap_or(&100);
            let mut replay = ScriptedTransport::new(clock);
            // Lines start after the power-up sequence has finished.
            replay.push_lines(&text, 1_000, interval);
            info!("replaying {} ({} bytes)", path.display(), replay.remaining());
            (config::unwired_lines(), Box::new(replay) as Box<dyn Transport>)
        }
        None => (config.control_lines()?, Box::new(config.transport()) as Box<dyn Transport>),
    };

    let mut program = DisplayProgram {
        board: Board::new(clock, lines, transport),
        display: OledWindow::new(app.as_weak()),
        ctx: DisplayContext::with_link(config.display.link()),
    };
    {
        let DisplayProgram { board, display, ctx } = &mut program;
        ctx.setup(board, display, &mut std::io::stdout())?;
    }

    let program = Rc::new(RefCell::new(program));
    let timer = slint::Timer::default();
    timer.start(slint::TimerMode::Repeated, Duration::from_millis(LOOP_PERIOD_MS), move || {
        let mut program = program.borrow_mut();
        let DisplayProgram { board, display, ctx } = &mut *program;
        let mut stdout = std::io::stdout();
        if let Err(e) = ctx.tick(board, display, &mut stdout) {
            warn!("display tick: {e}");
        }
        let _ = stdout.flush();
    });

    app.run()?;
    Ok(())
}
