//! RGB LED backend: mind2v1 (Jolla Tablet / Mind2 v1).
//!
//! Two units (inner and outer). Each has one `brightness` file in
//! `[0, 15]` and red, green and blue switches that only take 0 or 1. A
//! shared power switch is on while either unit is lit.

use crate::config::{ConfigError, LampSection, Mind2v1Section, require, require_section};
use crate::control::{BreathType, Capabilities, LedControl};
use crate::error::{ProbeError, Result};
use crate::sysfs::{SysfsFs, SysfsValue};
use crate::util;

use super::{Candidate, probe_candidates};

pub use super::mind2v2::Unit;

pub const MIN_BRIGHTNESS: i32 = 0;
pub const MAX_BRIGHTNESS: i32 = 15;

/// Unit brightness for a color: its strongest component, capped to the
/// hardware range without rescaling.
pub fn intensity(r: i32, g: i32, b: i32) -> i32 {
    util::clamp(r.max(g).max(b), MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

/// Control files of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampPaths<'a> {
    pub brightness: &'a str,
    pub red: &'a str,
    pub green: &'a str,
    pub blue: &'a str,
}

impl<'a> LampPaths<'a> {
    fn colors(&self) -> [&'a str; 3] {
        [self.red, self.green, self.blue]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mind2v1Paths<'a> {
    pub power: &'a str,
    /// Indexed by [`Unit`].
    pub units: [LampPaths<'a>; 2],
}

pub static CANDIDATES: &[Candidate<Mind2v1Paths<'static>>] = &[Candidate {
    label: "mind2v1",
    paths: Mind2v1Paths {
        power: "/sys/class/leds/Power/brightness",
        units: [
            LampPaths {
                brightness: "/sys/class/leds/Irgb/brightness",
                red: "/sys/class/leds/Ired/brightness",
                green: "/sys/class/leds/Igreen/brightness",
                blue: "/sys/class/leds/Iblue/brightness",
            },
            LampPaths {
                brightness: "/sys/class/leds/Orgb/brightness",
                red: "/sys/class/leds/Ored/brightness",
                green: "/sys/class/leds/Ogreen/brightness",
                blue: "/sys/class/leds/Oblue/brightness",
            },
        ],
    },
}];

/// Resolve `[mind2v1]`, `[mind2v1.inner]` and `[mind2v1.outer]` into paths.
pub fn paths_from_config(
    section: &Mind2v1Section,
) -> std::result::Result<Mind2v1Paths<'_>, ConfigError> {
    fn unit<'a>(
        section: &'a Option<LampSection>,
        name: &'static str,
    ) -> std::result::Result<LampPaths<'a>, ConfigError> {
        let s = require_section(section, name)?;
        Ok(LampPaths {
            brightness: require(&s.brightness, name, "brightness")?,
            red: require(&s.red, name, "red")?,
            green: require(&s.green, name, "green")?,
            blue: require(&s.blue, name, "blue")?,
        })
    }

    Ok(Mind2v1Paths {
        power: require(&section.power, "mind2v1", "power")?,
        units: [
            unit(&section.inner, "mind2v1.inner")?,
            unit(&section.outer, "mind2v1.outer")?,
        ],
    })
}

pub fn section_from_paths(paths: &Mind2v1Paths<'_>) -> Mind2v1Section {
    let unit = |p: &LampPaths<'_>| {
        Some(LampSection {
            brightness: Some(p.brightness.to_string()),
            red: Some(p.red.to_string()),
            green: Some(p.green.to_string()),
            blue: Some(p.blue.to_string()),
        })
    };
    Mind2v1Section {
        power: Some(paths.power.to_string()),
        inner: unit(&paths.units[Unit::Inner as usize]),
        outer: unit(&paths.units[Unit::Outer as usize]),
    }
}

// ── One unit ──

pub struct Lamp<F: SysfsFs> {
    brightness: SysfsValue<F>,
    colors: [SysfsValue<F>; 3],
}

impl<F: SysfsFs> Default for Lamp<F> {
    fn default() -> Self {
        Lamp {
            brightness: SysfsValue::new(),
            colors: Default::default(),
        }
    }
}

impl<F: SysfsFs> Lamp<F> {
    /// Open brightness, then the red, green and blue switches, all
    /// read-write. On failure everything is closed.
    pub fn probe(
        &mut self,
        fs: &F,
        paths: &LampPaths<'_>,
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
        paths: &LampPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        self.brightness
            .open_rw(fs, paths.brightness)
            .map_err(|e| ProbeError::open(paths.brightness, e))?;
        for (color, path) in self.colors.iter_mut().zip(paths.colors()) {
            color.open_rw(fs, path).map_err(|e| ProbeError::open(path, e))?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.brightness.close();
        for color in &mut self.colors {
            color.close();
        }
    }

    pub fn set_value(&mut self, r: i32, g: i32, b: i32) {
        for (color, v) in self.colors.iter_mut().zip([r, g, b]) {
            color.set(i32::from(v > 0));
        }
        self.brightness.set(intensity(r, g, b));
    }

    pub fn is_active(&self) -> bool {
        self.brightness.get() > 0
    }

    /// Cached unit brightness.
    pub fn brightness(&self) -> i32 {
        self.brightness.get()
    }

    /// Cached red, green and blue switches.
    pub fn colors(&self) -> [i32; 3] {
        [
            self.colors[0].get(),
            self.colors[1].get(),
            self.colors[2].get(),
        ]
    }
}

// ── Both units ──

/// Active mind2v1 backend.
pub struct Mind2v1<F: SysfsFs> {
    power: SysfsValue<F>,
    units: [Lamp<F>; 2],
}

impl<F: SysfsFs> Mind2v1<F> {
    pub const NAME: &'static str = "mind2v1";

    pub fn probe(fs: F, section: Option<&Mind2v1Section>) -> Result<Self> {
        Self::probe_with(fs, section, CANDIDATES)
    }

    pub fn probe_with(
        fs: F,
        section: Option<&Mind2v1Section>,
        candidates: &[Candidate<Mind2v1Paths<'_>>],
    ) -> Result<Self> {
        let mut state = Mind2v1 {
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
        paths: &Mind2v1Paths<'_>,
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

    /// Power follows the units: on while either is lit, off otherwise.
    pub fn update_power(&mut self) {
        let on = self.units.iter().any(Lamp::is_active);
        self.power.set(i32::from(on));
    }

    pub fn unit(&self, unit: Unit) -> &Lamp<F> {
        &self.units[unit as usize]
    }

    /// Cached power switch value, `-1` until first written.
    pub fn power(&self) -> i32 {
        self.power.get()
    }
}

impl<F: SysfsFs> LedControl for Mind2v1<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_breathe: false,
            breath_type: BreathType::Disabled,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedError;
    use crate::sysfs::mock::MockSysfs;

    const POWER: &str = "/sys/class/leds/Power/brightness";
    const IRGB: &str = "/sys/class/leds/Irgb/brightness";

    fn mind2v1_fs() -> MockSysfs {
        let fs = MockSysfs::new();
        fs.add_file(POWER, 0);
        for name in [
            "Irgb", "Ired", "Igreen", "Iblue", "Orgb", "Ored", "Ogreen", "Oblue",
        ] {
            fs.add_file(&format!("/sys/class/leds/{name}/brightness"), 0);
        }
        fs
    }

    #[test]
    fn intensity_caps_without_scaling() {
        assert_eq!(intensity(0, 0, 0), 0);
        assert_eq!(intensity(3, 9, 1), 9);
        assert_eq!(intensity(255, 0, 0), MAX_BRIGHTNESS);
        assert_eq!(intensity(-7, -1, -3), MIN_BRIGHTNESS);
        assert_eq!(intensity(i32::MAX, 0, 0), MAX_BRIGHTNESS);
    }

    #[test]
    fn probe_opens_power_then_units() {
        let fs = mind2v1_fs();
        Mind2v1::probe(fs.clone(), None).unwrap();

        let opened = fs.opened_paths();
        assert_eq!(opened[0], POWER);
        assert_eq!(opened[1], IRGB);
        assert_eq!(opened[2], "/sys/class/leds/Ired/brightness");
        assert_eq!(opened[5], "/sys/class/leds/Orgb/brightness");
        assert_eq!(fs.open_handles(), 9);
    }

    #[test]
    fn probe_rolls_back_on_missing_outer_switch() {
        let fs = mind2v1_fs();
        fs.remove("/sys/class/leds/Oblue/brightness");

        let err = Mind2v1::probe(fs.clone(), None).err().unwrap();
        assert!(matches!(err, LedError::ProbeFailed { backend: "mind2v1" }));
        assert_eq!(fs.open_handles(), 0);
        assert_eq!(fs.opened_paths().len(), fs.closed_paths().len());
    }

    #[test]
    fn value_sets_switches_and_brightness() {
        let fs = mind2v1_fs();
        let mut m = Mind2v1::probe(fs.clone(), None).unwrap();

        m.value(200, 0, 3);
        assert_eq!(m.unit(Unit::Inner).colors(), [1, 0, 1]);
        assert_eq!(m.unit(Unit::Inner).brightness(), 15);
        assert_eq!(fs.value(IRGB), Some(15));
        assert_eq!(fs.value("/sys/class/leds/Ired/brightness"), Some(1));
        assert_eq!(m.power(), 1);
    }

    #[test]
    fn power_switches_off_when_dark() {
        let fs = mind2v1_fs();
        let mut m = Mind2v1::probe(fs.clone(), None).unwrap();

        m.value(5, 0, 0);
        m.value(6, 0, 0);
        m.value(0, 0, 0);
        assert_eq!(fs.writes_to(POWER), vec![1, 0]);
        assert_eq!(fs.writes_to(IRGB), vec![5, 6, 0]);
    }

    #[test]
    fn one_lit_unit_keeps_power_on() {
        let fs = mind2v1_fs();
        let mut m = Mind2v1::probe(fs.clone(), None).unwrap();

        m.set_unit_value(Unit::Inner, 0, 0, 0);
        m.set_unit_value(Unit::Outer, 0, 5, 0);
        m.update_power();
        m.update_power();
        assert_eq!(fs.writes_to(POWER), vec![1]);
    }

    #[test]
    #[cfg(feature = "differentiate-outer-led")]
    fn outer_unit_rotates_colors() {
        let mut m = Mind2v1::probe(mind2v1_fs(), None).unwrap();
        m.value(9, 0, 0);
        assert_eq!(m.unit(Unit::Outer).colors(), [0, 0, 1]);
    }

    #[test]
    fn blink_is_unsupported() {
        let mut m = Mind2v1::probe(mind2v1_fs(), None).unwrap();
        assert!(matches!(
            m.blink(500, 500),
            Err(LedError::Unsupported { backend: "mind2v1", operation: "blink" })
        ));
        assert_eq!(
            m.capabilities(),
            Capabilities {
                can_breathe: false,
                breath_type: BreathType::Disabled
            }
        );
    }

    #[test]
    fn close_is_idempotent() {
        let fs = mind2v1_fs();
        let mut m = Mind2v1::probe(fs.clone(), None).unwrap();
        m.close();
        m.close();
        assert_eq!(fs.open_handles(), 0);
        assert_eq!(fs.closed_paths().len(), 9);
    }

    #[test]
    fn config_reports_first_missing_key() {
        let section = Mind2v1Section {
            power: Some(POWER.into()),
            inner: Some(LampSection {
                brightness: Some(IRGB.into()),
                ..LampSection::default()
            }),
            outer: None,
        };
        assert_eq!(
            paths_from_config(&section).unwrap_err(),
            ConfigError::MissingKey {
                section: "mind2v1.inner",
                key: "red"
            }
        );
    }

    #[test]
    fn section_from_builtin_paths_resolves_back() {
        let section = section_from_paths(&CANDIDATES[0].paths);
        assert_eq!(paths_from_config(&section).unwrap(), CANDIDATES[0].paths);
    }
}
