//! Single white LED with a hardware-reported maximum (Motorola Moto G 2nd
//! gen, Moto E LTE 2nd gen).
//!
//! max_brightness is read once while probing, then `brightness` is opened
//! write-only. The brightest requested component drives the LED.

use crate::config::{ConfigError, WhiteSection, require};
use crate::control::{BreathType, Capabilities, LedControl};
use crate::error::{ProbeError, Result};
use crate::sysfs::{SysfsFs, SysfsValue};
use crate::util;

use super::{Candidate, probe_candidates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhitePaths<'a> {
    pub brightness: &'a str,
    pub max_brightness: &'a str,
}

pub static CANDIDATES: &[Candidate<WhitePaths<'static>>] = &[
    Candidate {
        label: "moto-g",
        paths: WhitePaths {
            brightness: "/sys/class/leds/white/brightness",
            max_brightness: "/sys/class/leds/white/max_brightness",
        },
    },
    Candidate {
        label: "moto-e-lte",
        paths: WhitePaths {
            brightness: "/sys/class/leds/rgb/brightness",
            max_brightness: "/sys/class/leds/rgb/max_brightness",
        },
    },
];

pub fn paths_from_config(
    section: &WhiteSection,
) -> std::result::Result<WhitePaths<'_>, ConfigError> {
    Ok(WhitePaths {
        brightness: require(&section.brightness, "white", "brightness")?,
        max_brightness: require(&section.max_brightness, "white", "max_brightness")?,
    })
}

pub fn section_from_paths(paths: &WhitePaths<'_>) -> WhiteSection {
    WhiteSection {
        brightness: Some(paths.brightness.to_string()),
        max_brightness: Some(paths.max_brightness.to_string()),
    }
}

/// Collapse a color to the intensity of its strongest component.
pub fn map_color(r: i32, g: i32, b: i32) -> i32 {
    r.max(g).max(b)
}

pub struct WhiteChannel<F: SysfsFs> {
    brightness: SysfsValue<F>,
    max_brightness: SysfsValue<F>,
}

impl<F: SysfsFs> Default for WhiteChannel<F> {
    fn default() -> Self {
        WhiteChannel {
            brightness: SysfsValue::new(),
            max_brightness: SysfsValue::new(),
        }
    }
}

impl<F: SysfsFs> WhiteChannel<F> {
    pub fn probe(
        &mut self,
        fs: &F,
        paths: &WhitePaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        let result = self.open_files(fs, paths);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn open_files(
        &mut self,
        fs: &F,
        paths: &WhitePaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        self.max_brightness
            .open_ro(fs, paths.max_brightness)
            .map_err(|e| ProbeError::open(paths.max_brightness, e))?;
        let read = self.max_brightness.refresh();
        self.max_brightness.close();
        let max = read.map_err(|e| ProbeError::read(paths.max_brightness, e))?;
        if max <= 0 {
            return Err(ProbeError::InvalidMax {
                path: paths.max_brightness.to_string(),
                value: max,
            });
        }

        self.brightness
            .open_wo(fs, paths.brightness)
            .map_err(|e| ProbeError::open(paths.brightness, e))
    }

    pub fn set_value(&mut self, value: i32) {
        if self.brightness.is_open() {
            let max = self.max_brightness.get();
            self.brightness.set(util::scale_value(value, max));
        }
    }

    pub fn value(&self) -> i32 {
        self.brightness.get()
    }

    /// max_brightness as read during probing.
    pub fn max_brightness(&self) -> i32 {
        self.max_brightness.get()
    }

    pub fn close(&mut self) {
        self.max_brightness.close();
        self.brightness.close();
    }
}

/// Active white backend.
pub struct White<F: SysfsFs> {
    channel: WhiteChannel<F>,
}

impl<F: SysfsFs> White<F> {
    pub const NAME: &'static str = "white";

    pub fn probe(fs: F, section: Option<&WhiteSection>) -> Result<Self> {
        Self::probe_with(fs, section, CANDIDATES)
    }

    pub fn probe_with(
        fs: F,
        section: Option<&WhiteSection>,
        candidates: &[Candidate<WhitePaths<'_>>],
    ) -> Result<Self> {
        let mut channel = WhiteChannel::default();
        probe_candidates(
            Self::NAME,
            section.map(paths_from_config),
            candidates,
            |paths| channel.probe(&fs, paths),
        )?;
        Ok(White { channel })
    }

    pub fn channel(&self) -> &WhiteChannel<F> {
        &self.channel
    }
}

impl<F: SysfsFs> LedControl for White<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_breathe: true,
            breath_type: BreathType::HalfSine,
        }
    }

    fn value(&mut self, r: i32, g: i32, b: i32) {
        self.channel.set_value(map_color(r, g, b));
    }

    fn close(&mut self) {
        self.channel.close();
    }
}
