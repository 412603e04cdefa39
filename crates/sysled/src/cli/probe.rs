//! `probe` subcommand: find a usable backend and report its capabilities.

use super::{BackendKind, Options, ProbeOutput, Result, kv, kv_indent, kv_width, open_backend};

pub(super) fn cmd_probe(opts: &Options, backend: Option<BackendKind>) -> Result<()> {
    let mut led = open_backend(opts, backend)?;
    let caps = led.capabilities();
    let output = ProbeOutput {
        backend: led.name(),
        capabilities: caps,
        supports_blink: led.supports_blink(),
    };
    led.close();

    if opts.json {
        return super::print_json(&output);
    }

    let w = kv_width(
        &["Backend:", "Hardware blink:"],
        &["can_breathe:", "breath_type:"],
    );
    kv("Backend:", output.backend, w);
    kv(
        "Hardware blink:",
        if output.supports_blink { "yes" } else { "no" },
        w,
    );
    println!();
    println!("Software breathing:");
    kv_indent("can_breathe:", caps.can_breathe, w);
    kv_indent("breath_type:", caps.breath_type, w);
    Ok(())
}
