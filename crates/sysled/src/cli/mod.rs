//! CLI subcommands: probe backends, set LED colors, inspect configuration.

mod backends;
mod config_cmd;
mod probe;
mod set;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use sysled_lib::config::Config;
pub(super) use sysled_lib::error::Result;
pub(super) use sysled_lib::sysfs::HostFs;
pub(super) use sysled_lib::{BackendKind, Capabilities, LedControl, probe_backend};

const PADDING: usize = 2;

/// Global options shared by every subcommand.
pub struct Options {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
}

impl Options {
    /// Config file in effect: `--config` or the platform default.
    pub(super) fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Config::path)
    }

    /// Sysfs access, rooted at `--root` when given.
    pub(super) fn sysfs(&self) -> HostFs {
        match &self.root {
            Some(root) => HostFs::with_root(root),
            None => HostFs::new(),
        }
    }
}

/// Load config from `custom_path` or the default location, logging warnings.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    config
}

/// Probe with the loaded configuration; `backend` overrides its `backend` key.
pub(super) fn open_backend(
    opts: &Options,
    backend: Option<BackendKind>,
) -> Result<Box<dyn LedControl>> {
    let mut config = load_config(opts.config.as_deref());
    if backend.is_some() {
        config.backend = backend;
    }
    probe_backend(opts.sysfs(), &config)
}

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Pretty-print `value` as JSON on stdout.
pub(super) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{text}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ProbeOutput {
    pub backend: &'static str,
    pub capabilities: Capabilities,
    pub supports_blink: bool,
}

#[derive(Serialize)]
pub(super) struct SetOutput {
    pub backend: &'static str,
    pub value: [i32; 3],
    pub blink: Option<[i32; 2]>,
}

#[derive(Serialize)]
pub(super) struct BackendsOutput {
    pub backends: Vec<BackendJson>,
}

#[derive(Serialize)]
pub(super) struct BackendJson {
    pub name: &'static str,
    pub candidates: Vec<CandidateJson>,
}

#[derive(Serialize)]
pub(super) struct CandidateJson {
    pub label: &'static str,
    pub paths: Vec<&'static str>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// Probe for a usable LED backend and show its capabilities
    Probe {
        /// Only try this backend (mind2v2, mind2v1, vince, white, binary)
        #[arg(long)]
        backend: Option<BackendKind>,
    },

    /// Set the LED color (0-255 per channel)
    #[command(allow_negative_numbers = true)]
    Set {
        red: i32,
        green: i32,
        blue: i32,
        /// Hardware blinking with on/off periods in milliseconds
        #[arg(long, num_args = 2, value_names = ["ON_MS", "OFF_MS"])]
        blink: Option<Vec<i32>>,
        /// Only try this backend (mind2v2, mind2v1, vince, white, binary)
        #[arg(long)]
        backend: Option<BackendKind>,
        /// Keep the LED lit until Ctrl+C, then switch it off
        #[arg(long)]
        hold: bool,
    },

    /// List known backends and their built-in sysfs paths
    Backends,

    /// Show current configuration and file paths
    Config {
        /// Write a config file pre-filled with the built-in paths
        #[arg(long)]
        init: bool,
        /// Overwrite an existing config file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

pub fn run(cmd: Command, opts: &Options) -> Result<()> {
    match cmd {
        Command::Probe { backend } => probe::cmd_probe(opts, backend),
        Command::Set {
            red,
            green,
            blue,
            blink,
            backend,
            hold,
        } => {
            let blink = blink.and_then(|b| match b.as_slice() {
                &[on, off] => Some([on, off]),
                _ => None,
            });
            set::cmd_set(opts, [red, green, blue], blink, backend, hold)
        }
        Command::Backends => backends::cmd_backends(opts.json),
        Command::Config { init, force } => {
            if init {
                config_cmd::cmd_config_init(opts, force)
            } else {
                config_cmd::cmd_config(opts)
            }
        }
    }
}


#[cfg(test)]
mod json_output_tests {
    use super::*;
    use sysled_lib::BreathType;

    #[test]
    fn probe_output_fields() {
        let output = ProbeOutput {
            backend: "vince",
            capabilities: Capabilities {
                can_breathe: false,
                breath_type: BreathType::Disabled,
            },
            supports_blink: true,
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["backend"], "vince");
        assert_eq!(parsed["capabilities"]["breath_type"], "disabled");
        assert_eq!(parsed["supports_blink"], true);
    }

    #[test]
    fn set_output_without_blink_is_null() {
        let output = SetOutput {
            backend: "binary",
            value: [255, 0, 0],
            blink: None,
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["value"], serde_json::json!([255, 0, 0]));
        assert!(parsed["blink"].is_null());
    }

    #[test]
    fn config_output_missing_path_is_null() {
        let output = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            settings: Config::default(),
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert!(parsed["config_file"].is_null());
        assert_eq!(parsed["settings"]["use_config"], true);
        assert!(parsed["settings"].get("backend").is_none());
    }
}
