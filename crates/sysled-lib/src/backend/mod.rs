//! Device-specific LED backends and the candidate probing loop they share.

pub mod binary;
pub mod mind2v1;
pub mod mind2v2;
pub mod vince;
pub mod white;

pub use binary::Binary;
pub use mind2v1::Mind2v1;
pub use mind2v2::Mind2v2;
pub use vince::Vince;
pub use white::White;

use crate::config::ConfigError;
use crate::error::{LedError, ProbeError, Result};

/// One hardware wiring hypothesis: a full set of control file paths.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<P> {
    /// Device or board the paths were taken from.
    pub label: &'static str,
    pub paths: P,
}

/// Try candidate path sets in order until `attempt` accepts one.
///
/// A configured candidate goes first. If the configuration is incomplete it
/// is skipped before any file is opened. `attempt` must leave nothing open
/// when it returns an error.
pub(crate) fn probe_candidates<P>(
    backend: &'static str,
    configured: Option<std::result::Result<P, ConfigError>>,
    builtin: &[Candidate<P>],
    mut attempt: impl FnMut(&P) -> std::result::Result<(), ProbeError>,
) -> Result<()> {
    match configured {
        Some(Ok(paths)) => match attempt(&paths) {
            Ok(()) => {
                log::debug!("{backend}: using configured paths");
                return Ok(());
            }
            Err(e) => log::debug!("{backend}: config: {e}"),
        },
        Some(Err(e)) => log::warn!("{backend}: config: {e}; trying built-in paths"),
        None => {}
    }

    for candidate in builtin {
        match attempt(&candidate.paths) {
            Ok(()) => {
                log::debug!("{backend}: using {} paths", candidate.label);
                return Ok(());
            }
            Err(e) => log::debug!("{backend}: {}: {e}", candidate.label),
        }
    }

    Err(LedError::ProbeFailed { backend })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject(path: &str) -> ProbeError {
        ProbeError::open(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        )
    }

    #[test]
    fn first_accepted_builtin_wins() {
        let builtin = [
            Candidate {
                label: "a",
                paths: "/a",
            },
            Candidate {
                label: "b",
                paths: "/b",
            },
            Candidate {
                label: "c",
                paths: "/c",
            },
        ];
        let mut tried = Vec::new();
        probe_candidates("test", None, &builtin, |p| {
            tried.push(*p);
            if *p == "/b" { Ok(()) } else { Err(reject(p)) }
        })
        .unwrap();
        assert_eq!(tried, vec!["/a", "/b"]);
    }

    #[test]
    fn configured_candidate_goes_first() {
        let builtin = [Candidate {
            label: "a",
            paths: "/a",
        }];
        let mut tried = Vec::new();
        probe_candidates("test", Some(Ok("/cfg")), &builtin, |p| {
            tried.push(*p);
            Ok(())
        })
        .unwrap();
        assert_eq!(tried, vec!["/cfg"]);
    }

    #[test]
    fn rejected_configured_candidate_falls_back() {
        let builtin = [Candidate {
            label: "a",
            paths: "/a",
        }];
        let mut tried = Vec::new();
        probe_candidates("test", Some(Ok("/cfg")), &builtin, |p| {
            tried.push(*p);
            if *p == "/a" { Ok(()) } else { Err(reject(p)) }
        })
        .unwrap();
        assert_eq!(tried, vec!["/cfg", "/a"]);
    }

    #[test]
    fn incomplete_config_is_never_attempted() {
        let builtin = [Candidate {
            label: "a",
            paths: "/a",
        }];
        let mut tried = Vec::new();
        probe_candidates(
            "test",
            Some(Err(ConfigError::MissingSection("test"))),
            &builtin,
            |p| {
                tried.push(*p);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(tried, vec!["/a"]);
    }

    #[test]
    fn nothing_accepted_is_probe_failure() {
        let builtin = [Candidate {
            label: "a",
            paths: "/a",
        }];
        let err = probe_candidates("test", None, &builtin, |p| Err(reject(p))).unwrap_err();
        assert!(matches!(err, LedError::ProbeFailed { backend: "test" }));
    }
}
