//! Stimulus generator
//!
//! Provokes the target library's loading behavior by profiling the root
//! supervisory process (launchd, PID 1) with /usr/bin/sample. If the library
//! attaches to system activity, the sampling pass makes it more likely to
//! produce evidence on the observation channels during the round.

use crate::constants;
use log::{error, info};
use std::process::{Command, Stdio};

/// Triggers one external sampling pass per round. Side-effecting only:
/// never raises the detection signal, and failure never fails the round.
pub struct SampleStimulus {
    program: String,
    args: Vec<String>,
}

impl SampleStimulus {
    pub fn new() -> Self {
        Self {
            program: constants::SAMPLE_TOOL.to_string(),
            args: vec![
                constants::STIMULUS_TARGET_PID.to_string(),
                constants::STIMULUS_DURATION_SECS.to_string(),
            ],
        }
    }

    /// Build a stimulus over an arbitrary command, for tests simulating a
    /// missing or failing sampling tool.
    pub fn with_command(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Run the sampling tool to completion, logging and swallowing failure.
    pub fn trigger(&self) {
        info!(
            "triggering sample on pid {} for {}s",
            constants::STIMULUS_TARGET_PID,
            constants::STIMULUS_DURATION_SECS
        );
        match Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => info!("sample completed"),
            Ok(status) => error!("sample exited with {status}"),
            Err(err) => error!("could not run sample: {err}"),
        }
    }
}

impl Default for SampleStimulus {
    fn default() -> Self {
        Self::new()
    }
}
