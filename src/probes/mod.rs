//! Observation probes
//!
//! Each probe independently samples one OS observation channel for the
//! artifact's signature. Two mechanisms cover the four channels:
//! - polling probes snapshot a text source at a fixed interval
//!   (open file table via lsof, process table via sysinfo)
//! - streaming probes read a live tracing subprocess line by line
//!   (filesystem activity via fs_usage, open syscalls via dtrace)
//!
//! All probes are fault tolerant: a dead or missing tool is logged and
//! reported as no-match, never as an error.

pub mod poll;
pub mod stream;

pub use poll::PollProbe;
pub use stream::StreamProbe;

use crate::models::{ProbeOutcome, ProbeSource, ToolError};
use crate::signal::ProbeContext;
use std::process::{Command, Stdio};

/// One observation unit racing its siblings within a round.
pub trait Probe: Send + Sync {
    fn source(&self) -> ProbeSource;

    /// Observe the channel until a match, the bounded window elapses, or the
    /// context reports a sibling match / user interrupt. On a match the probe
    /// raises the shared signal before returning.
    fn run(&self, ctx: &ProbeContext) -> ProbeOutcome;
}

/// Run a snapshot tool to completion and return its stdout as text.
/// stderr is discarded; lsof in particular is noisy about permissions.
pub(crate) fn tool_snapshot(program: &str, args: &[String]) -> Result<String, ToolError> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ToolError::Unavailable {
            tool: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: program.to_string(),
            status: output.status,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
