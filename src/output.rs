//! Output formatting module
//!
//! Handles:
//! - Human-readable rendering of the terminal detection output
//! - JSON output via serde
//! - Summary statistics

use crate::models::DetectionOutput;
use anyhow::Result;

/// Format output in human-readable format
pub fn format_human(output: &DetectionOutput) -> Result<()> {
    if output.reports.is_empty() {
        println!("Artifact was not located.");
    } else {
        println!("Located and analyzed {} artifact(s):\n", output.reports.len());

        for report in &output.reports {
            let marker = if report.hidden { " (hidden)" } else { "" };
            println!("{}{}:", report.path.display(), marker);

            match &report.signature_info {
                Some(info) => {
                    println!("  Code signature:");
                    for line in info.lines().filter(|l| !l.trim().is_empty()) {
                        println!("    {}", line.trim_end());
                    }
                }
                None => println!("  Code signature: (inspection failed)"),
            }

            if report.dependencies.is_empty() {
                println!("  Linked libraries: (none reported)");
            } else {
                println!("  Linked libraries:");
                for dependency in &report.dependencies {
                    println!("    {dependency}");
                }
            }

            match &report.copied_to {
                Some(destination) => println!("  Evidence copy: {}", destination.display()),
                None => println!("  Evidence copy: (copy failed)"),
            }
            println!();
        }
    }

    let summary = &output.summary;
    println!("Detection Summary:");
    println!("  Rounds: {}", summary.rounds);

    let duration_sec = summary.duration_ms as f64 / 1000.0;
    if duration_sec < 1.0 {
        println!("  Duration: {}ms", summary.duration_ms);
    } else {
        println!("  Duration: {duration_sec:.2}s");
    }

    if let Some(true) = summary.interrupted {
        println!("  Status: Interrupted by user");
    }

    Ok(())
}

/// Format output as pretty-printed JSON
pub fn format_json(output: &DetectionOutput) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisReport, RunSummary};
    use std::path::PathBuf;

    fn sample_output() -> DetectionOutput {
        DetectionOutput {
            reports: vec![AnalysisReport {
                path: PathBuf::from("/usr/local/lib/libdz.dylib"),
                hidden: false,
                signature_info: Some("Identifier=libdz\nSignature=adhoc".to_string()),
                dependencies: vec!["/usr/lib/libSystem.B.dylib".to_string()],
                copied_to: Some(PathBuf::from("./libdz.dylib")),
            }],
            summary: RunSummary {
                rounds: 2,
                duration_ms: 1500,
                interrupted: None,
            },
        }
    }

    #[test]
    fn json_output_round_trips() {
        let json = format_json(&sample_output()).unwrap();
        let parsed: DetectionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.summary.rounds, 2);
        assert_eq!(
            parsed.reports[0].dependencies,
            vec!["/usr/lib/libSystem.B.dylib".to_string()]
        );
    }

    #[test]
    fn human_format_handles_empty_reports() {
        let output = DetectionOutput {
            reports: vec![],
            summary: RunSummary {
                rounds: 5,
                duration_ms: 400,
                interrupted: Some(true),
            },
        };
        assert!(format_human(&output).is_ok());
    }
}
