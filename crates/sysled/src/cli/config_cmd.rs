//! `config` subcommand: show current configuration, or write a template.

use std::io;

use super::{BackendKind, Config, ConfigOutput, Options, Result, kv, kv_indent, kv_width};

/// Label for an optional path-like value.
fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("(unset)")
}

/// Default probing order, e.g. `mind2v2, mind2v1, vince, white, binary`.
fn auto_order() -> String {
    BackendKind::ALL.map(BackendKind::name).join(", ")
}

pub(super) fn cmd_config(opts: &Options) -> Result<()> {
    let config = super::load_config(opts.config.as_deref());
    let config_path = opts.config_path();
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if opts.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
        };
        return super::print_json(&output);
    }

    let w = kv_width(
        &["Config file:", "Sysfs root:"],
        &[
            "backend:",
            "use_config:",
            "[mind2v2]:",
            "[mind2v1]:",
            "[vince]:",
            "[white]:",
            "[binary]:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    match &opts.root {
        Some(root) => kv("Sysfs root:", root.display(), w),
        None => kv("Sysfs root:", "/", w),
    }
    println!();

    println!("Settings:");
    match config.backend {
        Some(b) => kv_indent("backend:", b, w),
        None => kv_indent("backend:", format_args!("(auto: {})", auto_order()), w),
    }
    kv_indent("use_config:", config.use_config, w);
    let present = |yes: bool| if yes { "present" } else { "(none)" };
    kv_indent("[mind2v2]:", present(config.mind2v2.is_some()), w);
    kv_indent("[mind2v1]:", present(config.mind2v1.is_some()), w);
    kv_indent("[vince]:", present(config.vince.is_some()), w);
    kv_indent(
        "[white]:",
        or_unset(config.white.as_ref().and_then(|s| s.brightness.as_deref())),
        w,
    );
    kv_indent(
        "[binary]:",
        or_unset(
            config
                .binary
                .as_ref()
                .and_then(|b| b.brightness.as_deref()),
        ),
        w,
    );
    Ok(())
}

pub(super) fn cmd_config_init(opts: &Options, force: bool) -> Result<()> {
    let path = opts.config_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no config directory, use --config")
    })?;
    if path.exists() && !force {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force)", path.display()),
        )
        .into());
    }

    Config::with_builtin_paths().save_to(&path)?;
    log::info!("wrote {}", path.display());

    if opts.json {
        return super::print_json(&ConfigOutput {
            config_file: Some(path.display().to_string()),
            config_file_exists: true,
            settings: Config::with_builtin_paths(),
        });
    }
    println!("Wrote {}", path.display());
    Ok(())
}
