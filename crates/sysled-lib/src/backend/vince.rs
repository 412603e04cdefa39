//! RGB LED backend: vince (Xiaomi Redmi 5 Plus).
//!
//! Three channels, each of which must have `brightness`, `max_brightness`
//! and `blink` control files.
//!
//! Writing `blink` affects `brightness` and vice versa, so the two are always
//! written together in a fixed order; see [`VinceChannel::set_value`].

use crate::config::{ChannelSection, ConfigError, VinceSection, require, require_section};
use crate::control::{BreathType, Capabilities, LedControl};
use crate::error::{ProbeError, Result};
use crate::sysfs::{SysfsFs, SysfsValue};
use crate::util;

use super::{Candidate, probe_candidates};

pub const CHANNELS: usize = 3;

/// Panel supports 4095 levels while the LED class reports 255; requests are
/// multiplied by this and capped at [`MAX_VALUE`].
pub const VALUE_MULTIPLIER: i32 = 16;
pub const MAX_VALUE: i32 = 255;

/// Written to max_brightness before reading it back. The kernel side is
/// expected to cap it to the true maximum.
pub const PROBE_MAX_BRIGHTNESS: i32 = 255;

/// Control files of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPaths<'a> {
    pub brightness: &'a str,
    pub max_brightness: &'a str,
    pub blink: &'a str,
}

/// Red, green and blue channel paths.
pub type VincePaths<'a> = [ChannelPaths<'a>; CHANNELS];

const fn led(
    brightness: &'static str,
    max_brightness: &'static str,
    blink: &'static str,
) -> ChannelPaths<'static> {
    ChannelPaths {
        brightness,
        max_brightness,
        blink,
    }
}

/// Built-in wiring hypotheses, tried in order.
///
/// Redmi 5 Plus exposes its single notification LED as "red" only, so every
/// channel drives the same files. Boards with separate red/green/blue LEDs
/// need `[vince.*]` configuration sections.
pub static CANDIDATES: &[Candidate<VincePaths<'static>>] = &[Candidate {
    label: "vince",
    paths: [
        led(
            "/sys/class/leds/red/brightness",
            "/sys/class/leds/red/max_brightness",
            "/sys/class/leds/red/blink",
        ),
        led(
            "/sys/class/leds/red/brightness",
            "/sys/class/leds/red/max_brightness",
            "/sys/class/leds/red/blink",
        ),
        led(
            "/sys/class/leds/red/brightness",
            "/sys/class/leds/red/max_brightness",
            "/sys/class/leds/red/blink",
        ),
    ],
}];

/// Resolve `[vince.red]`, `[vince.green]` and `[vince.blue]` into paths.
pub fn paths_from_config(
    section: &VinceSection,
) -> std::result::Result<VincePaths<'_>, ConfigError> {
    fn channel<'a>(
        section: &'a Option<ChannelSection>,
        name: &'static str,
    ) -> std::result::Result<ChannelPaths<'a>, ConfigError> {
        let section = require_section(section, name)?;
        Ok(ChannelPaths {
            brightness: require(&section.brightness, name, "brightness")?,
            max_brightness: require(&section.max_brightness, name, "max_brightness")?,
            blink: require(&section.blink, name, "blink")?,
        })
    }

    Ok([
        channel(&section.red, "vince.red")?,
        channel(&section.green, "vince.green")?,
        channel(&section.blue, "vince.blue")?,
    ])
}

/// Inverse of [`paths_from_config`], used to write a config template.
pub fn section_from_paths(paths: &VincePaths<'_>) -> VinceSection {
    let channel = |p: &ChannelPaths<'_>| {
        Some(ChannelSection {
            brightness: Some(p.brightness.to_string()),
            max_brightness: Some(p.max_brightness.to_string()),
            blink: Some(p.blink.to_string()),
        })
    };
    VinceSection {
        red: channel(&paths[0]),
        green: channel(&paths[1]),
        blue: channel(&paths[2]),
    }
}

// ── One channel ──

pub struct VinceChannel<F: SysfsFs> {
    max_brightness: SysfsValue<F>,
    brightness: SysfsValue<F>,
    blink: SysfsValue<F>,

    control_value: i32,
    control_blink: bool,
}

impl<F: SysfsFs> Default for VinceChannel<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SysfsFs> VinceChannel<F> {
    pub fn new() -> Self {
        VinceChannel {
            max_brightness: SysfsValue::new(),
            brightness: SysfsValue::new(),
            blink: SysfsValue::new(),
            control_value: 0,
            control_blink: false,
        }
    }

    /// Open the channel's control files.
    ///
    /// max_brightness is only needed during probing and is always closed
    /// afterwards; on failure everything opened here is closed.
    pub fn probe(
        &mut self,
        fs: &F,
        paths: &ChannelPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        let result = self.open_files(fs, paths);

        self.max_brightness.close();
        if result.is_err() {
            self.close();
        }
        result
    }

    fn open_files(
        &mut self,
        fs: &F,
        paths: &ChannelPaths<'_>,
    ) -> std::result::Result<(), ProbeError> {
        // Least likely to exist first: every LED has brightness, most have
        // max_brightness, only some have blink.
        self.blink
            .open_rw(fs, paths.blink)
            .map_err(|e| ProbeError::open(paths.blink, e))?;

        self.max_brightness
            .open_ro(fs, paths.max_brightness)
            .map_err(|e| ProbeError::open(paths.max_brightness, e))?;

        // max_brightness seems to be dynamic: ask for an artificially high
        // value and let the kernel cap it to the true maximum.
        self.max_brightness.set(PROBE_MAX_BRIGHTNESS);
        let _ = self.max_brightness.refresh();

        let max = self.max_brightness.get();
        if max <= 0 {
            return Err(ProbeError::InvalidMax {
                path: paths.max_brightness.to_string(),
                value: max,
            });
        }

        self.brightness
            .open_rw(fs, paths.brightness)
            .map_err(|e| ProbeError::open(paths.brightness, e))?;

        Ok(())
    }

    pub fn close(&mut self) {
        self.max_brightness.close();
        self.brightness.close();
        self.blink.close();
    }

    pub fn is_open(&self) -> bool {
        self.brightness.is_open() && self.blink.is_open()
    }

    /// Scale an 8-bit request into the panel range.
    pub fn scale_value(value: i32) -> i32 {
        util::clamp(value.saturating_mul(VALUE_MULTIPLIER), 0, MAX_VALUE)
    }

    /// Apply an intensity, honouring the cached blink request.
    ///
    /// Switching between blinking and static modes can leave stale sysfs
    /// state behind, so each call writes in a fixed order:
    /// blinking → brightness=0 then blink=1;
    /// static → blink=0 then brightness=value.
    /// The upper layer sequences mode changes as cancel, black, new mode with
    /// a kernel delay between the steps.
    pub fn set_value(&mut self, value: i32) {
        let value = Self::scale_value(value);
        self.control_value = value;

        // Blinking while dark is meaningless.
        if value <= 0 {
            self.control_blink = false;
        }

        if self.control_blink {
            self.brightness.set(0);
            self.blink.set(1);
        } else {
            self.blink.set(0);
            self.brightness.set(value);
        }
    }

    /// Cache a blink request; it takes effect on the next [`set_value`](Self::set_value).
    pub fn set_blink(&mut self, on_ms: i32, off_ms: i32) {
        self.control_blink = on_ms != 0 && off_ms != 0;
    }

    /// Last scaled intensity.
    pub fn control_value(&self) -> i32 {
        self.control_value
    }

    pub fn is_blinking(&self) -> bool {
        self.control_blink
    }

    /// max_brightness as read during probing.
    pub fn max_brightness(&self) -> i32 {
        self.max_brightness.get()
    }
}

// ── All channels ──

/// Active vince backend.
pub struct Vince<F: SysfsFs> {
    channels: [VinceChannel<F>; CHANNELS],
}

impl<F: SysfsFs> Vince<F> {
    pub const NAME: &'static str = "vince";

    /// Probe configured paths (if any), then the built-in [`CANDIDATES`].
    pub fn probe(fs: F, section: Option<&VinceSection>) -> Result<Self> {
        Self::probe_with(fs, section, CANDIDATES)
    }

    /// Probe against an explicit candidate list.
    pub fn probe_with(
        fs: F,
        section: Option<&VinceSection>,
        candidates: &[Candidate<VincePaths<'_>>],
    ) -> Result<Self> {
        let mut channels: [VinceChannel<F>; CHANNELS] = Default::default();

        probe_candidates(
            Self::NAME,
            section.map(paths_from_config),
            candidates,
            |paths| {
                let result = channels
                    .iter_mut()
                    .zip(paths)
                    .try_for_each(|(channel, path)| channel.probe(&fs, path));
                if result.is_err() {
                    channels.iter_mut().for_each(VinceChannel::close);
                }
                result
            },
        )?;

        Ok(Vince { channels })
    }

    pub fn channel(&self, index: usize) -> Option<&VinceChannel<F>> {
        self.channels.get(index)
    }
}

impl<F: SysfsFs> LedControl for Vince<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Prefers the built-in hardware blinking over software breathing.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_breathe: false,
            breath_type: BreathType::Disabled,
        }
    }

    fn blink(&mut self, on_ms: i32, off_ms: i32) -> Result<()> {
        // Blink and brightness affect each other; only cache the request
        // here and write both from value().
        for channel in &mut self.channels {
            channel.set_blink(on_ms, off_ms);
        }
        Ok(())
    }

    fn supports_blink(&self) -> bool {
        true
    }

    fn value(&mut self, r: i32, g: i32, b: i32) {
        for (channel, v) in self.channels.iter_mut().zip([r, g, b]) {
            channel.set_value(v);
        }
    }

    fn close(&mut self) {
        for channel in &mut self.channels {
            channel.close();
        }
    }
}
