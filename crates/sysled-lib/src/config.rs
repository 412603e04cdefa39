//! Configuration: TOML file with optional per-backend sysfs path overrides.
//!
//! ```toml
//! backend = "vince"
//!
//! [white]
//! brightness = "/sys/class/leds/white/brightness"
//! max_brightness = "/sys/class/leds/white/max_brightness"
//!
//! [vince.red]
//! brightness = "/sys/class/leds/red/brightness"
//! max_brightness = "/sys/class/leds/red/max_brightness"
//! blink = "/sys/class/leds/red/blink"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::BackendKind;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str = "# sysled configuration\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Only probe this backend. Unset = try every backend in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Try the path sections below before the built-in paths.
    #[serde(default = "default_true")]
    pub use_config: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vince: Option<VinceSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mind2v2: Option<Mind2v2Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mind2v1: Option<Mind2v1Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<WhiteSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinarySection>,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: None,
            use_config: true,
            vince: None,
            mind2v2: None,
            mind2v1: None,
            white: None,
            binary: None,
        }
    }
}

/// `[vince.red]`, `[vince.green]`, `[vince.blue]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VinceSection {
    pub red: Option<ChannelSection>,
    pub green: Option<ChannelSection>,
    pub blue: Option<ChannelSection>,
}

/// Control files of one vince channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSection {
    pub brightness: Option<String>,
    pub max_brightness: Option<String>,
    pub blink: Option<String>,
}

/// `[mind2v2]` with `[mind2v2.inner]` and `[mind2v2.outer]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mind2v2Section {
    pub power: Option<String>,
    pub inner: Option<RgbUnitSection>,
    pub outer: Option<RgbUnitSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbUnitSection {
    pub red: Option<String>,
    pub green: Option<String>,
    pub blue: Option<String>,
    pub red_max: Option<String>,
    pub green_max: Option<String>,
    pub blue_max: Option<String>,
}

/// `[mind2v1]` with `[mind2v1.inner]` and `[mind2v1.outer]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mind2v1Section {
    pub power: Option<String>,
    pub inner: Option<LampSection>,
    pub outer: Option<LampSection>,
}

/// One mind2v1 unit: a shared brightness plus on/off color switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LampSection {
    pub brightness: Option<String>,
    pub red: Option<String>,
    pub green: Option<String>,
    pub blue: Option<String>,
}

/// `[white]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteSection {
    pub brightness: Option<String>,
    pub max_brightness: Option<String>,
}

/// `[binary]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinarySection {
    pub brightness: Option<String>,
}

/// A configuration section could not be turned into a candidate path set.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required table such as `[vince.red]` is absent.
    MissingSection(&'static str),
    /// A required path key is absent or empty.
    MissingKey {
        section: &'static str,
        key: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSection(section) => write!(f, "missing section [{section}]"),
            ConfigError::MissingKey { section, key } => {
                write!(f, "missing key {key} in [{section}]")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Fetch a required path key, treating empty strings as missing.
pub fn require<'a>(
    value: &'a Option<String>,
    section: &'static str,
    key: &'static str,
) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => Ok(path),
        _ => Err(ConfigError::MissingKey { section, key }),
    }
}

/// Fetch a required sub-table.
pub fn require_section<'a, T>(
    value: &'a Option<T>,
    section: &'static str,
) -> Result<&'a T, ConfigError> {
    value.as_ref().ok_or(ConfigError::MissingSection(section))
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sysled"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Defaults with every backend section filled from its first built-in
    /// candidate. Starting point for hand-editing.
    pub fn with_builtin_paths() -> Self {
        use crate::backend::{binary, mind2v1, mind2v2, vince, white};

        Config {
            vince: vince::CANDIDATES
                .first()
                .map(|c| vince::section_from_paths(&c.paths)),
            mind2v2: mind2v2::CANDIDATES
                .first()
                .map(|c| mind2v2::section_from_paths(&c.paths)),
            mind2v1: mind2v1::CANDIDATES
                .first()
                .map(|c| mind2v1::section_from_paths(&c.paths)),
            white: white::CANDIDATES
                .first()
                .map(|c| white::section_from_paths(&c.paths)),
            binary: binary::CANDIDATES
                .first()
                .map(|c| binary::section_from_paths(&c.paths)),
            ..Config::default()
        }
    }

    /// Vince overrides, if configuration-driven probing is enabled.
    pub fn vince_section(&self) -> Option<&VinceSection> {
        self.vince.as_ref().filter(|_| self.use_config)
    }

    /// Mind2v2 overrides, if configuration-driven probing is enabled.
    pub fn mind2v2_section(&self) -> Option<&Mind2v2Section> {
        self.mind2v2.as_ref().filter(|_| self.use_config)
    }

    pub fn mind2v1_section(&self) -> Option<&Mind2v1Section> {
        self.mind2v1.as_ref().filter(|_| self.use_config)
    }

    pub fn white_section(&self) -> Option<&WhiteSection> {
        self.white.as_ref().filter(|_| self.use_config)
    }

    /// Binary overrides, if configuration-driven probing is enabled.
    pub fn binary_section(&self) -> Option<&BinarySection> {
        self.binary.as_ref().filter(|_| self.use_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.backend, None);
        assert!(c.use_config);
        assert!(c.vince.is_none());
        assert!(c.mind2v2.is_none());
        assert!(c.mind2v1.is_none());
        assert!(c.white.is_none());
        assert!(c.binary.is_none());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn parses_backend_name() {
        let c: Config = toml::from_str("backend = \"mind2v2\"").unwrap();
        assert_eq!(c.backend, Some(BackendKind::Mind2v2));
    }

    #[test]
    fn unknown_backend_name_is_parse_error() {
        let result: std::result::Result<Config, _> = toml::from_str("backend = \"hammerhead\"");
        assert!(result.is_err());
    }

    #[test]
    fn parses_vince_sections() {
        let toml_str = r#"
[vince.red]
brightness = "/a/brightness"
max_brightness = "/a/max_brightness"
blink = "/a/blink"

[vince.green]
brightness = "/b/brightness"
"#;
        let c: Config = toml::from_str(toml_str).unwrap();
        let vince = c.vince.unwrap();
        let red = vince.red.unwrap();
        assert_eq!(red.blink.as_deref(), Some("/a/blink"));
        let green = vince.green.unwrap();
        assert_eq!(green.brightness.as_deref(), Some("/b/brightness"));
        assert!(green.max_brightness.is_none());
        assert!(vince.blue.is_none());
    }

    #[test]
    fn parses_mind2v2_sections() {
        let toml_str = r#"
[mind2v2]
power = "/p"

[mind2v2.inner]
red = "/ir"
red_max = "/irm"
"#;
        let c: Config = toml::from_str(toml_str).unwrap();
        let m = c.mind2v2.unwrap();
        assert_eq!(m.power.as_deref(), Some("/p"));
        assert_eq!(m.inner.unwrap().red_max.as_deref(), Some("/irm"));
        assert!(m.outer.is_none());
    }

    #[test]
    fn parses_mind2v1_and_white_sections() {
        let toml_str = r#"
[mind2v1]
power = "/sys/class/leds/Power/brightness"

[mind2v1.outer]
brightness = "/sys/class/leds/Orgb/brightness"
blue = "/sys/class/leds/Oblue/brightness"

[white]
max_brightness = "/sys/class/leds/white/max_brightness"
"#;
        let c: Config = toml::from_str(toml_str).unwrap();
        let m = c.mind2v1.as_ref().unwrap();
        assert!(m.inner.is_none());
        let outer = m.outer.as_ref().unwrap();
        assert_eq!(
            outer.brightness.as_deref(),
            Some("/sys/class/leds/Orgb/brightness")
        );
        assert!(outer.red.is_none());
        let white = c.white_section().unwrap();
        assert!(white.brightness.is_none());
    }

    #[test]
    fn wrong_type_toml_is_error() {
        let result: std::result::Result<Config, _> = toml::from_str("use_config = \"yes\"");
        assert!(result.is_err());
    }

    #[test]
    fn sections_hidden_when_use_config_disabled() {
        let c = Config {
            use_config: false,
            binary: Some(BinarySection {
                brightness: Some("/x".into()),
            }),
            ..Config::default()
        };
        assert!(c.binary_section().is_none());

        let c = Config {
            use_config: true,
            ..c
        };
        assert!(c.binary_section().is_some());
    }

    #[test]
    fn require_accepts_present_key() {
        let v = Some("/sys/class/leds/red/blink".to_string());
        assert_eq!(
            require(&v, "vince.red", "blink").unwrap(),
            "/sys/class/leds/red/blink"
        );
    }

    #[test]
    fn require_rejects_missing_and_empty() {
        assert_eq!(
            require(&None, "vince.red", "blink").unwrap_err(),
            ConfigError::MissingKey {
                section: "vince.red",
                key: "blink"
            }
        );
        assert!(require(&Some("  ".into()), "vince.red", "blink").is_err());
    }

    #[test]
    fn require_section_reports_name() {
        let missing: Option<ChannelSection> = None;
        assert_eq!(
            require_section(&missing, "vince.blue").unwrap_err(),
            ConfigError::MissingSection("vince.blue")
        );
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::MissingSection("mind2v2.outer").to_string(),
            "missing section [mind2v2.outer]"
        );
        assert_eq!(
            ConfigError::MissingKey {
                section: "binary",
                key: "brightness"
            }
            .to_string(),
            "missing key brightness in [binary]"
        );
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(path) = Config::path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let c = Config {
            backend: Some(BackendKind::Vince),
            use_config: false,
            vince: Some(VinceSection {
                red: Some(ChannelSection {
                    brightness: Some("/r/brightness".into()),
                    max_brightness: Some("/r/max_brightness".into()),
                    blink: Some("/r/blink".into()),
                }),
                ..VinceSection::default()
            }),
            ..Config::default()
        };
        c.save_to(&path).unwrap();

        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, c);
    }

    #[test]
    fn builtin_template_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let c = Config::with_builtin_paths();
        assert!(c.vince.is_some() && c.mind2v2.is_some() && c.binary.is_some());
        assert!(c.mind2v1.is_some() && c.white.is_some());

        c.save_to(&path).unwrap();
        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, c);
        assert_eq!(
            loaded.binary_section().unwrap().brightness.as_deref(),
            Some("/sys/class/leds/button-backlight/brightness")
        );
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# sysled configuration"));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(c, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
    }
}
