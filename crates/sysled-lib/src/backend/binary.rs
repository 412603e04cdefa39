//! Single on/off LED, e.g. a button backlight.
//!
//! Only a write-only `brightness` file is needed. Any requested color lights
//! the LED fully; blinking is left to software breathing with a hard-step
//! ramp.

use crate::config::{BinarySection, ConfigError, require};
use crate::control::{BreathType, Capabilities, LedControl};
use crate::error::{ProbeError, Result};
use crate::sysfs::{SysfsFs, SysfsValue};
use crate::util;

use super::{Candidate, probe_candidates};

/// Logical level for "on" before scaling.
const ON_LEVEL: i32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryPaths<'a> {
    pub brightness: &'a str,
}

pub static CANDIDATES: &[Candidate<BinaryPaths<'static>>] = &[
    Candidate {
        label: "binary",
        paths: BinaryPaths {
            brightness: "/sys/class/leds/button-backlight/brightness",
        },
    },
    // Motorola Moto E LTE (2nd gen)
    Candidate {
        label: "moto-e-lte",
        paths: BinaryPaths {
            brightness: "/sys/class/leds/rgb/brightness",
        },
    },
];

pub fn paths_from_config(
    section: &BinarySection,
) -> std::result::Result<BinaryPaths<'_>, ConfigError> {
    Ok(BinaryPaths {
        brightness: require(&section.brightness, "binary", "brightness")?,
    })
}

pub fn section_from_paths(paths: &BinaryPaths<'_>) -> BinarySection {
    BinarySection {
        brightness: Some(paths.brightness.to_string()),
    }
}

/// Collapse a color to a single on/off level.
pub fn map_color(r: i32, g: i32, b: i32) -> i32 {
    if r != 0 || g != 0 || b != 0 { ON_LEVEL } else { 0 }
}

pub struct BinaryChannel<F: SysfsFs> {
    brightness: SysfsValue<F>,
    max: i32,
}

impl<F: SysfsFs> Default for BinaryChannel<F> {
    fn default() -> Self {
        BinaryChannel {
            brightness: SysfsValue::new(),
            max: 1,
        }
    }
}

impl<F: SysfsFs> BinaryChannel<F> {
    pub fn probe(
        &mut self,
        fs: &F,
        paths: &BinaryPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        self.brightness
            .open_wo(fs, paths.brightness)
            .map_err(|e| ProbeError::open(paths.brightness, e))
    }

    pub fn set_value(&mut self, value: i32) {
        if self.brightness.is_open() {
            self.brightness.set(util::scale_value(value, self.max));
        }
    }

    pub fn value(&self) -> i32 {
        self.brightness.get()
    }

    pub fn close(&mut self) {
        self.brightness.close();
    }
}

/// Active binary backend.
pub struct Binary<F: SysfsFs> {
    channel: BinaryChannel<F>,
}

impl<F: SysfsFs> Binary<F> {
    pub const NAME: &'static str = "binary";

    pub fn probe(fs: F, section: Option<&BinarySection>) -> Result<Self> {
        Self::probe_with(fs, section, CANDIDATES)
    }

    pub fn probe_with(
        fs: F,
        section: Option<&BinarySection>,
        candidates: &[Candidate<BinaryPaths<'_>>],
    ) -> Result<Self> {
        let mut channel = BinaryChannel::default();
        probe_candidates(
            Self::NAME,
            section.map(paths_from_config),
            candidates,
            |paths| channel.probe(&fs, paths),
        )?;
        Ok(Binary { channel })
    }

    pub fn channel(&self) -> &BinaryChannel<F> {
        &self.channel
    }
}

impl<F: SysfsFs> LedControl for Binary<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Software breathing with a step ramp stands in for blinking.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_breathe: true,
            breath_type: BreathType::HardStep,
        }
    }

    fn value(&mut self, r: i32, g: i32, b: i32) {
        self.channel.set_value(map_color(r, g, b));
    }

    fn close(&mut self) {
        self.channel.close();
    }
}
