//! Data models module
//!
//! Defines core data structures:
//! - ProbeOutcome: per-probe result record consumed by the coordinator
//! - ArtifactLocation: a filesystem hit produced by the locator
//! - AnalysisReport: forensic inspection results for one located artifact
//! - DetectorConfig: tunables threaded from the CLI into the detector
//! - DetectionOutput/RunSummary: terminal output for human or JSON rendering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants;

/// The observation channel a probe samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeSource {
    /// System-wide open file descriptor table (lsof)
    OpenFiles,
    /// Live filesystem activity trace (fs_usage)
    FileSystemTrace,
    /// Live open-syscall entry trace (dtrace)
    SyscallTrace,
    /// Full process listing with command lines
    ProcessTable,
}

impl std::fmt::Display for ProbeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProbeSource::OpenFiles => "open-files",
            ProbeSource::FileSystemTrace => "fs-trace",
            ProbeSource::SyscallTrace => "syscall-trace",
            ProbeSource::ProcessTable => "process-table",
        };
        f.write_str(name)
    }
}

/// Result record produced by a probe at the end of its run.
/// The shared detection signal is the synchronization primitive;
/// this record exists for the coordinator's logging and decision step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Which observation channel produced this outcome
    pub source: ProbeSource,
    /// Whether the signature was observed on this channel
    pub matched: bool,
    /// When the probe finished (or matched)
    pub observed_at: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn new(source: ProbeSource, matched: bool) -> Self {
        Self {
            source,
            matched,
            observed_at: Utc::now(),
        }
    }
}

/// A filesystem location where the artifact was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Absolute path to the artifact
    pub path: PathBuf,
    /// Whether this is the dot-prefixed hidden variant of the name
    pub hidden: bool,
}

impl ArtifactLocation {
    pub fn new(path: PathBuf) -> Self {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        Self { path, hidden }
    }
}

/// Forensic inspection results for one located artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Path the artifact was analyzed at
    pub path: PathBuf,
    /// Whether the path was the hidden (dot-prefixed) variant
    pub hidden: bool,
    /// Raw diagnostic output from the code-signature inspector, if it ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_info: Option<String>,
    /// Linked libraries reported by the dependency inspector, in listing order
    pub dependencies: Vec<String>,
    /// Where the evidence copy was written, if the copy succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_to: Option<PathBuf>,
}

/// Summary statistics for a detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of detection rounds executed
    pub rounds: u64,
    /// Total run duration in milliseconds
    pub duration_ms: u64,
    /// Whether the run was interrupted by user signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
}

/// Complete output structure for JSON serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOutput {
    /// One report per located artifact (empty if the run ended without one)
    pub reports: Vec<AnalysisReport>,
    /// Summary statistics
    pub summary: RunSummary,
}

/// Configuration for a detection run
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Literal filename searched for on every observation channel
    pub signature: String,
    /// Root of the filesystem search performed by the locator
    pub search_root: PathBuf,
    /// Directory the evidence copy is written into
    pub output_dir: PathBuf,
    /// Pause between rounds when no probe matched
    pub backoff: Duration,
    /// Maximum number of rounds before giving up; None runs until detection
    pub max_rounds: Option<u64>,
    /// Interval between snapshots for polling probes
    pub poll_interval: Duration,
    /// Wall-clock budget for each probe within a round
    pub probe_window: Duration,
    /// Wall-clock budget for the locator's filesystem search
    pub locate_timeout: Duration,
    /// Whether to emit JSON instead of human-readable output
    pub json_output: bool,
    /// Whether to suppress per-round progress on stdout
    pub quiet_mode: bool,
    /// Whether to log to macOS Unified Logging instead of stderr
    pub use_uls: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            signature: constants::SIGNATURE_NAME.to_string(),
            search_root: PathBuf::from("/"),
            output_dir: PathBuf::from("."),
            backoff: constants::ROUND_BACKOFF,
            max_rounds: None,
            poll_interval: constants::POLL_INTERVAL,
            probe_window: constants::PROBE_WINDOW,
            locate_timeout: constants::LOCATE_TIMEOUT,
            json_output: false,
            quiet_mode: false,
            use_uls: false,
        }
    }
}

/// External tool failures absorbed at component boundaries.
/// None of these ever surface as a process-level error; probes map them to
/// matched=false and the locator maps them to an empty result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool '{tool}' could not be started: {source}")]
    Unavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool '{tool}' exited with {status}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
    },
    #[error("tool '{tool}' exceeded its {budget:?} budget")]
    Timeout { tool: String, budget: Duration },
}
