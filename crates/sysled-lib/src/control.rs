//! LED control contract shared by all backends, plus backend selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::{Binary, Mind2v1, Mind2v2, Vince, White};
use crate::config::Config;
use crate::error::{LedError, Result};
use crate::sysfs::SysfsFs;

/// Brightness ramp the upper layer should use for software breathing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreathType {
    /// Software breathing not used.
    #[default]
    Disabled,
    /// The default half sine curve.
    HalfSine,
    /// Step function, emulates blinking via software breathing.
    HardStep,
    Triangle,
    Sawtooth,
    Sine,
}

impl fmt::Display for BreathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BreathType::Disabled => "disabled",
            BreathType::HalfSine => "half-sine",
            BreathType::HardStep => "hard-step",
            BreathType::Triangle => "triangle",
            BreathType::Sawtooth => "sawtooth",
            BreathType::Sine => "sine",
        };
        f.write_str(name)
    }
}

/// Capability hints consumed by the animation scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub can_breathe: bool,
    pub breath_type: BreathType,
}

/// A probed, active LED backend.
///
/// Holds every open control file of the backend. `value` and `blink` never
/// fail mid-operation; write failures are logged by the value store.
pub trait LedControl {
    /// Backend identifier for diagnostics.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Hardware enable switch. None of the sysfs backends has one.
    fn enable(&mut self, _enable: bool) {}

    /// Request hardware blinking with the given on/off periods.
    fn blink(&mut self, _on_ms: i32, _off_ms: i32) -> Result<()> {
        Err(LedError::Unsupported {
            backend: self.name(),
            operation: "blink",
        })
    }

    fn supports_blink(&self) -> bool {
        false
    }

    /// Apply an 8-bit-per-channel color.
    fn value(&mut self, r: i32, g: i32, b: i32);

    /// Release every control file. Safe to call more than once.
    fn close(&mut self);
}

// ── Backend selection ──

/// Known backends, in default probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Two RGB units plus a shared power switch.
    Mind2v2,
    /// Two units of on/off colors with a shared brightness, plus power.
    Mind2v1,
    /// Three channels with brightness/max_brightness/blink each.
    Vince,
    /// One dimmable white channel.
    White,
    /// One on/off channel.
    Binary,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Mind2v2,
        BackendKind::Mind2v1,
        BackendKind::Vince,
        BackendKind::White,
        BackendKind::Binary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Mind2v2 => "mind2v2",
            BackendKind::Mind2v1 => "mind2v1",
            BackendKind::Vince => "vince",
            BackendKind::White => "white",
            BackendKind::Binary => "binary",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = LedError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        BackendKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LedError::UnknownBackend(s.to_string()))
    }
}

/// Probe a single backend.
pub fn probe_kind<F>(kind: BackendKind, fs: F, config: &Config) -> Result<Box<dyn LedControl>>
where
    F: SysfsFs + 'static,
{
    let control: Box<dyn LedControl> = match kind {
        BackendKind::Mind2v2 => Box::new(Mind2v2::probe(fs, config.mind2v2_section())?),
        BackendKind::Mind2v1 => Box::new(Mind2v1::probe(fs, config.mind2v1_section())?),
        BackendKind::Vince => Box::new(Vince::probe(fs, config.vince_section())?),
        BackendKind::White => Box::new(White::probe(fs, config.white_section())?),
        BackendKind::Binary => Box::new(Binary::probe(fs, config.binary_section())?),
    };
    log::info!("{}: LED backend active", control.name());
    Ok(control)
}

/// Probe the configured backend, or every backend in [`BackendKind::ALL`]
/// order until one succeeds.
pub fn probe_backend<F>(fs: F, config: &Config) -> Result<Box<dyn LedControl>>
where
    F: SysfsFs + Clone + 'static,
{
    if let Some(kind) = config.backend {
        return probe_kind(kind, fs, config);
    }

    for kind in BackendKind::ALL {
        match probe_kind(kind, fs.clone(), config) {
            Ok(control) => return Ok(control),
            Err(e) => log::debug!("{e}"),
        }
    }
    Err(LedError::NoBackend)
}
