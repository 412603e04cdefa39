//! RGB LED backend: mind2v2 (Jolla Tablet / Mind2 v2).
//!
//! Two RGB units (inner and outer), each channel with a `brightness` and a
//! `max_brightness` file, plus one shared power switch. The kernel only
//! lights the units while the power file holds a non-zero value.

use crate::config::{ConfigError, Mind2v2Section, RgbUnitSection, require, require_section};
use crate::control::{BreathType, Capabilities, LedControl};
use crate::error::{ProbeError, Result};
use crate::sysfs::{SysfsFs, SysfsValue};
use crate::util;

use super::{Candidate, probe_candidates};

pub const MIN_BRIGHTNESS: i32 = 1;
pub const MAX_BRIGHTNESS: i32 = 63;

/// Scale a 0..255 intensity into `[MIN_BRIGHTNESS, min(max, MAX_BRIGHTNESS)]`.
///
/// Zero stays zero so a dark channel never powers the LED.
pub fn scale_value(value: i32, max: i32) -> i32 {
    if value <= 0 {
        return 0;
    }
    util::trans(value, 1, 255, MIN_BRIGHTNESS, max.min(MAX_BRIGHTNESS))
}

/// Control files of one RGB unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbUnitPaths<'a> {
    pub red: &'a str,
    pub green: &'a str,
    pub blue: &'a str,

    pub red_max: &'a str,
    pub green_max: &'a str,
    pub blue_max: &'a str,
}

impl<'a> RgbUnitPaths<'a> {
    fn brightness(&self) -> [&'a str; 3] {
        [self.red, self.green, self.blue]
    }

    fn max_brightness(&self) -> [&'a str; 3] {
        [self.red_max, self.green_max, self.blue_max]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mind2v2Paths<'a> {
    pub power: &'a str,
    /// Indexed by [`Unit`].
    pub units: [RgbUnitPaths<'a>; 2],
}

/// Which of the two RGB units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Inner = 0,
    Outer = 1,
}

pub static CANDIDATES: &[Candidate<Mind2v2Paths<'static>>] = &[Candidate {
    label: "mind2v2",
    paths: Mind2v2Paths {
        power: "/sys/class/leds/Led/brightness",
        units: [
            RgbUnitPaths {
                red: "/sys/class/leds/Ired/brightness",
                green: "/sys/class/leds/Igreen/brightness",
                blue: "/sys/class/leds/Iblue/brightness",
                red_max: "/sys/class/leds/Ired/max_brightness",
                green_max: "/sys/class/leds/Igreen/max_brightness",
                blue_max: "/sys/class/leds/Iblue/max_brightness",
            },
            RgbUnitPaths {
                red: "/sys/class/leds/Ored/brightness",
                green: "/sys/class/leds/Ogreen/brightness",
                blue: "/sys/class/leds/Oblue/brightness",
                red_max: "/sys/class/leds/Ored/max_brightness",
                green_max: "/sys/class/leds/Ogreen/max_brightness",
                blue_max: "/sys/class/leds/Oblue/max_brightness",
            },
        ],
    },
}];

/// Resolve `[mind2v2]`, `[mind2v2.inner]` and `[mind2v2.outer]` into paths.
pub fn paths_from_config(
    section: &Mind2v2Section,
) -> std::result::Result<Mind2v2Paths<'_>, ConfigError> {
    fn unit<'a>(
        section: &'a Option<RgbUnitSection>,
        name: &'static str,
    ) -> std::result::Result<RgbUnitPaths<'a>, ConfigError> {
        let s = require_section(section, name)?;
        Ok(RgbUnitPaths {
            red: require(&s.red, name, "red")?,
            green: require(&s.green, name, "green")?,
            blue: require(&s.blue, name, "blue")?,
            red_max: require(&s.red_max, name, "red_max")?,
            green_max: require(&s.green_max, name, "green_max")?,
            blue_max: require(&s.blue_max, name, "blue_max")?,
        })
    }

    Ok(Mind2v2Paths {
        power: require(&section.power, "mind2v2", "power")?,
        units: [
            unit(&section.inner, "mind2v2.inner")?,
            unit(&section.outer, "mind2v2.outer")?,
        ],
    })
}

/// Inverse of [`paths_from_config`], used to write a config template.
pub fn section_from_paths(paths: &Mind2v2Paths<'_>) -> Mind2v2Section {
    let unit = |p: &RgbUnitPaths<'_>| {
        Some(RgbUnitSection {
            red: Some(p.red.to_string()),
            green: Some(p.green.to_string()),
            blue: Some(p.blue.to_string()),
            red_max: Some(p.red_max.to_string()),
            green_max: Some(p.green_max.to_string()),
            blue_max: Some(p.blue_max.to_string()),
        })
    };
    Mind2v2Section {
        power: Some(paths.power.to_string()),
        inner: unit(&paths.units[Unit::Inner as usize]),
        outer: unit(&paths.units[Unit::Outer as usize]),
    }
}

// ── One RGB unit ──

pub struct RgbUnit<F: SysfsFs> {
    value: [SysfsValue<F>; 3],
    max: [SysfsValue<F>; 3],
}

impl<F: SysfsFs> Default for RgbUnit<F> {
    fn default() -> Self {
        RgbUnit {
            value: Default::default(),
            max: Default::default(),
        }
    }
}

impl<F: SysfsFs> RgbUnit<F> {
    /// Open brightness (rw) and max_brightness (ro) for all three colors and
    /// read the maxima. max_brightness files are closed afterwards; on
    /// failure everything is.
    pub fn probe(
        &mut self,
        fs: &F,
        paths: &RgbUnitPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        let result = self.open_files(fs, paths);

        for max in &mut self.max {
            max.close();
        }
        if result.is_err() {
            self.close();
        }
        result
    }

    fn open_files(
        &mut self,
        fs: &F,
        paths: &RgbUnitPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        for (value, path) in self.value.iter_mut().zip(paths.brightness()) {
            value.open_rw(fs, path).map_err(|e| ProbeError::open(path, e))?;
        }
        for (max, path) in self.max.iter_mut().zip(paths.max_brightness()) {
            max.open_ro(fs, path).map_err(|e| ProbeError::open(path, e))?;
        }
        for (max, path) in self.max.iter_mut().zip(paths.max_brightness()) {
            max.refresh().map_err(|e| ProbeError::read(path, e))?;
        }
        for (max, path) in self.max.iter().zip(paths.max_brightness()) {
            if max.get() <= 0 {
                return Err(ProbeError::InvalidMax {
                    path: path.to_string(),
                    value: max.get(),
                });
            }
        }
        Ok(())
    }

    pub fn close(&mut self) {
        for v in self.value.iter_mut().chain(self.max.iter_mut()) {
            v.close();
        }
    }

    pub fn set_value(&mut self, r: i32, g: i32, b: i32) {
        for ((value, max), v) in self.value.iter_mut().zip(&self.max).zip([r, g, b]) {
            value.set(scale_value(v, max.get()));
        }
    }

    /// Any channel currently lit.
    pub fn is_active(&self) -> bool {
        self.value.iter().any(|v| v.get() > 0)
    }

    /// Cached brightness of red, green and blue.
    pub fn values(&self) -> [i32; 3] {
        [self.value[0].get(), self.value[1].get(), self.value[2].get()]
    }

    /// max_brightness of red, green and blue as read during probing.
    pub fn max_values(&self) -> [i32; 3] {
        [self.max[0].get(), self.max[1].get(), self.max[2].get()]
    }
}

// ── Both units ──

/// Active mind2v2 backend.
pub struct Mind2v2<F: SysfsFs> {
    power: SysfsValue<F>,
    units: [RgbUnit<F>; 2],
}

impl<F: SysfsFs> Mind2v2<F> {
    pub const NAME: &'static str = "mind2v2";

    /// Probe configured paths (if any), then the built-in [`CANDIDATES`].
    pub fn probe(fs: F, section: Option<&Mind2v2Section>) -> Result<Self> {
        Self::probe_with(fs, section, CANDIDATES)
    }

    pub fn probe_with(
        fs: F,
        section: Option<&Mind2v2Section>,
        candidates: &[Candidate<Mind2v2Paths<'_>>],
    ) -> Result<Self> {
        let mut state = Mind2v2 {
            power: SysfsValue::new(),
            units: Default::default(),
        };

        probe_candidates(
            Self::NAME,
            section.map(paths_from_config),
            candidates,
            |paths| {
                let result = state.open_files(&fs, paths);
                if result.is_err() {
                    state.close_all();
                }
                result
            },
        )?;

        Ok(state)
    }

    fn open_files(
        &mut self,
        fs: &F,
        paths: &Mind2v2Paths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        self.power
            .open_rw(fs, paths.power)
            .map_err(|e| ProbeError::open(paths.power, e))?;

        for (unit, unit_paths) in self.units.iter_mut().zip(&paths.units) {
            unit.probe(fs, unit_paths)?;
        }
        Ok(())
    }

    fn close_all(&mut self) {
        self.power.close();
        for unit in &mut self.units {
            unit.close();
        }
    }

    /// Drive a single unit. Call [`update_power`](Self::update_power)
    /// afterwards.
    pub fn set_unit_value(&mut self, unit: Unit, r: i32, g: i32, b: i32) {
        self.units[unit as usize].set_value(r, g, b);
    }

    /// Switch power on if any channel of any unit is lit.
    ///
    /// Power is never switched off again; dark channels are enough to keep
    /// the LED dark.
    pub fn update_power(&mut self) {
        if self.units.iter().any(RgbUnit::is_active) {
            self.power.set(1);
        }
    }

    pub fn unit(&self, unit: Unit) -> &RgbUnit<F> {
        &self.units[unit as usize]
    }

    /// Cached power switch value, `-1` until first written.
    pub fn power(&self) -> i32 {
        self.power.get()
    }
}

impl<F: SysfsFs> LedControl for Mind2v2<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_breathe: true,
            breath_type: BreathType::Sine,
        }
    }

    fn value(&mut self, r: i32, g: i32, b: i32) {
        self.set_unit_value(Unit::Inner, r, g, b);
        if cfg!(feature = "differentiate-outer-led") {
            self.set_unit_value(Unit::Outer, g, b, r);
        } else {
            self.set_unit_value(Unit::Outer, r, g, b);
        }
        self.update_power();
    }

    fn close(&mut self) {
        self.close_all();
    }
}
