//! `backends` subcommand: list backends and their built-in candidate paths.

use sysled_lib::backend::{binary, mind2v1, mind2v2, vince, white};

use super::{BackendJson, BackendKind, BackendsOutput, CandidateJson, Result};

fn candidates(kind: BackendKind) -> Vec<CandidateJson> {
    match kind {
        BackendKind::Mind2v2 => mind2v2::CANDIDATES
            .iter()
            .map(|c| {
                let mut paths = vec![c.paths.power];
                for unit in &c.paths.units {
                    paths.extend([
                        unit.red,
                        unit.green,
                        unit.blue,
                        unit.red_max,
                        unit.green_max,
                        unit.blue_max,
                    ]);
                }
                CandidateJson {
                    label: c.label,
                    paths,
                }
            })
            .collect(),
        BackendKind::Mind2v1 => mind2v1::CANDIDATES
            .iter()
            .map(|c| {
                let mut paths = vec![c.paths.power];
                for unit in &c.paths.units {
                    paths.extend([unit.brightness, unit.red, unit.green, unit.blue]);
                }
                CandidateJson {
                    label: c.label,
                    paths,
                }
            })
            .collect(),
        BackendKind::Vince => vince::CANDIDATES
            .iter()
            .map(|c| {
                let mut paths = Vec::new();
                for ch in &c.paths {
                    // The shared-red candidate repeats the same files.
                    for p in [ch.brightness, ch.max_brightness, ch.blink] {
                        if !paths.contains(&p) {
                            paths.push(p);
                        }
                    }
                }
                CandidateJson {
                    label: c.label,
                    paths,
                }
            })
            .collect(),
        BackendKind::White => white::CANDIDATES
            .iter()
            .map(|c| CandidateJson {
                label: c.label,
                paths: vec![c.paths.brightness, c.paths.max_brightness],
            })
            .collect(),
        BackendKind::Binary => binary::CANDIDATES
            .iter()
            .map(|c| CandidateJson {
                label: c.label,
                paths: vec![c.paths.brightness],
            })
            .collect(),
    }
}

pub(super) fn cmd_backends(json: bool) -> Result<()> {
    let output = BackendsOutput {
        backends: BackendKind::ALL
            .into_iter()
            .map(|kind| BackendJson {
                name: kind.name(),
                candidates: candidates(kind),
            })
            .collect(),
    };

    if json {
        return super::print_json(&output);
    }

    for (i, backend) in output.backends.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}:", backend.name);
        for candidate in &backend.candidates {
            println!("  [{}]", candidate.label);
            for path in &candidate.paths {
                println!("    {path}");
            }
        }
    }
    Ok(())
}
