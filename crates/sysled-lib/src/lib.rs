//! sysled: sysfs RGB LED control backends for phone notification LEDs.

pub mod backend;
pub mod config;
pub mod control;
pub mod error;
pub mod sysfs;
pub mod util;

pub use control::{BackendKind, BreathType, Capabilities, LedControl, probe_backend, probe_kind};
pub use error::LedError;
