//! Host wiring: which serial adapter stands in for which board pins.

use anyhow::{Context, Result};
use gnssprobe_core::board::NMEA_BAUD_RATE;
use gnssprobe_core::serial_service::open_control_port;
use gnssprobe_core::{
    ControlLines, LinkConfig, ModemLine, ModemSignal, NullLine, OutputLine, PinVariant,
    SerialTransport,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// UART pin pair -> host serial port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub rx: u8,
    pub tx: u8,
    pub port: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineBinding {
    pub signal: ModemSignal,
    #[serde(default)]
    pub invert: bool,
}

/// Adapter whose modem signals drive the module's control lines.
/// Lines without a binding are left unwired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    pub port: String,
    pub power: Option<LineBinding>,
    pub wake: Option<LineBinding>,
    pub reset: Option<LineBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub variant: PinVariant,
    pub baud: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            variant: PinVariant::A,
            baud: NMEA_BAUD_RATE,
        }
    }
}

impl DisplayConfig {
    pub fn link(&self) -> LinkConfig {
        self.variant.link(self.baud)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub routes: Vec<Route>,
    pub control: Option<ControlConfig>,
    pub display: DisplayConfig,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gnss-probe").join("config.json"))
    }

    /// Load `path`, or the default location when present, or built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    info!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("parsing {}", path.display()))?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn transport(&self) -> SerialTransport {
        self.routes
            .iter()
            .fold(SerialTransport::new(), |t, r| t.route(r.rx, r.tx, r.port.clone()))
    }

    pub fn control_lines(&self) -> Result<ControlLines> {
        let Some(control) = &self.control else {
            return Ok(unwired_lines());
        };
        let port = open_control_port(&control.port)?;

        let bind = |name: &'static str, binding: Option<LineBinding>| -> Box<dyn OutputLine> {
            match binding {
                Some(b) => Box::new(ModemLine::new(port.clone(), b.signal, b.invert)),
                None => Box::new(NullLine::new(name)),
            }
        };

        Ok(ControlLines {
            power: bind("power", control.power),
            wake: bind("wake", control.wake),
            reset: bind("reset", control.reset),
        })
    }
}

pub fn unwired_lines() -> ControlLines {
    ControlLines {
        power: Box::new(NullLine::new("power")),
        wake: Box::new(NullLine::new("wake")),
        reset: Box::new(NullLine::new("reset")),
    }
}
