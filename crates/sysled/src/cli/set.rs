//! `set` subcommand: apply a color (and optionally hardware blinking).

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{BackendKind, Options, RUNNING, Result, SetOutput, open_backend};

/// Poll interval while holding the LED lit.
const HOLD_POLL: Duration = Duration::from_millis(100);

pub(super) fn cmd_set(
    opts: &Options,
    rgb: [i32; 3],
    blink: Option<[i32; 2]>,
    backend: Option<BackendKind>,
    hold: bool,
) -> Result<()> {
    let mut led = open_backend(opts, backend)?;
    let [r, g, b] = rgb;

    // Blink is cached by the backend and applied together with the value.
    if let Some([on_ms, off_ms]) = blink {
        led.blink(on_ms, off_ms)?;
    }
    led.value(r, g, b);

    let output = SetOutput {
        backend: led.name(),
        value: rgb,
        blink,
    };
    if opts.json {
        super::print_json(&output)?;
    } else {
        match blink {
            Some([on_ms, off_ms]) => println!(
                "{}: {r} {g} {b} (blink {on_ms}/{off_ms} ms)",
                output.backend
            ),
            None => println!("{}: {r} {g} {b}", output.backend),
        }
    }

    if hold {
        if !opts.json {
            println!("Holding, press Ctrl+C to switch off...");
        }
        while RUNNING.load(Ordering::SeqCst) {
            std::thread::sleep(HOLD_POLL);
        }
        if led.supports_blink() {
            led.blink(0, 0)?;
        }
        led.value(0, 0, 0);
    }

    led.close();
    Ok(())
}
