//! Global constants for dzhunt
//!
//! Centralized location for application-wide constants

use std::time::Duration;

/// Application subsystem identifier for macOS Unified Logging System
pub const APP_SUBSYSTEM: &str = "com.microsoft.sysinternals.dzhunt";

/// Canonical filename of the library this tool hunts for
pub const SIGNATURE_NAME: &str = "libdz.dylib";

/// PID of the root supervisory process sampled to stimulate library loading
pub const STIMULUS_TARGET_PID: u32 = 1;

/// How long the sampling tool profiles the stimulus target, in seconds
pub const STIMULUS_DURATION_SECS: u32 = 5;

/// Interval between snapshots for polling probes (lsof, process table)
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Wall-clock budget for a single probe within a round
pub const PROBE_WINDOW: Duration = Duration::from_secs(10);

/// Wall-clock budget for the filesystem-wide artifact search
pub const LOCATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause between rounds when no probe matched
pub const ROUND_BACKOFF: Duration = Duration::from_secs(5);

/// Sampling/profiling tool invoked by the stimulus generator
pub const SAMPLE_TOOL: &str = "/usr/bin/sample";

/// Open-file lister polled by the OpenFiles probe
pub const LSOF_TOOL: &str = "lsof";

/// Streaming filesystem-activity tracer
pub const FS_USAGE_TOOL: &str = "fs_usage";

/// Streaming syscall tracer
pub const DTRACE_TOOL: &str = "dtrace";

/// DTrace program printing the path argument of every open-family syscall
pub const DTRACE_OPEN_SCRIPT: &str =
    r#"syscall::open*:entry { printf("%s\n", copyinstr(arg0)); }"#;

/// Filesystem search tool used by the locator
pub const FIND_TOOL: &str = "find";

/// Code-signature inspector
pub const CODESIGN_TOOL: &str = "codesign";

/// Linked-library inspector
pub const OTOOL_TOOL: &str = "otool";
