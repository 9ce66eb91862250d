//! Streaming probes: scan a live tracing subprocess line by line
//!
//! Covers the FileSystemTrace channel (fs_usage) and the SyscallTrace
//! channel (dtrace filtered to open-family syscalls). The subprocess output
//! is pumped through a channel by a reader thread so the wall-clock window
//! holds even when the tracer emits nothing, and the child handle is wrapped
//! in a kill-on-drop guard so it is terminated on every exit path.

use crate::constants;
use crate::models::{ProbeOutcome, ProbeSource};
use crate::probes::Probe;
use crate::signal::ProbeContext;
use log::{debug, info, warn};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// A probe that spawns a streaming tracer and matches each output line
/// against the signature within a bounded wall-clock window.
pub struct StreamProbe {
    source: ProbeSource,
    signature: String,
    window: Duration,
    program: String,
    args: Vec<String>,
}

/// Terminates the traced subprocess when the probe leaves its run loop,
/// whatever the exit path. fs_usage and dtrace run until killed.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

impl StreamProbe {
    /// FileSystemTrace variant: streams `fs_usage` and watches for the
    /// signature in any filesystem event line.
    pub fn fs_trace(signature: &str, window: Duration) -> Self {
        Self {
            source: ProbeSource::FileSystemTrace,
            signature: signature.to_string(),
            window,
            program: constants::FS_USAGE_TOOL.to_string(),
            args: Vec::new(),
        }
    }

    /// SyscallTrace variant: streams a dtrace program printing the path
    /// argument of every open-family syscall.
    pub fn syscall_trace(signature: &str, window: Duration) -> Self {
        Self {
            source: ProbeSource::SyscallTrace,
            signature: signature.to_string(),
            window,
            program: constants::DTRACE_TOOL.to_string(),
            args: vec!["-n".to_string(), constants::DTRACE_OPEN_SCRIPT.to_string()],
        }
    }

    /// Build a streaming probe over an arbitrary command. Used by the canned
    /// variants above and by tests that substitute a scripted child.
    pub fn with_command(
        source: ProbeSource,
        signature: &str,
        window: Duration,
        program: &str,
        args: Vec<String>,
    ) -> Self {
        Self {
            source,
            signature: signature.to_string(),
            window,
            program: program.to_string(),
            args,
        }
    }
}

impl Probe for StreamProbe {
    fn source(&self) -> ProbeSource {
        self.source
    }

    fn run(&self, ctx: &ProbeContext) -> ProbeOutcome {
        debug!("{}: streaming {} for {:?}", self.source, self.program, self.window);

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut guard = match child {
            Ok(child) => ChildGuard(child),
            Err(err) => {
                warn!("{}: could not start {}: {err}", self.source, self.program);
                return ProbeOutcome::new(self.source, false);
            }
        };

        let Some(stdout) = guard.0.stdout.take() else {
            warn!("{}: {} produced no output handle", self.source, self.program);
            return ProbeOutcome::new(self.source, false);
        };

        // Reader thread feeds lines into the channel; it unblocks on its own
        // once the guard kills the child and the pipe closes.
        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let deadline = Instant::now() + self.window;
        while Instant::now() < deadline {
            if ctx.should_stop() {
                break;
            }
            match rx.recv_timeout(Duration::from_millis(250)) {
                Ok(line) => {
                    if line.contains(&self.signature) {
                        info!("{}: {} detected", self.source, self.signature);
                        ctx.report_match();
                        return ProbeOutcome::new(self.source, true);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                // Child exited (or its pipe closed); nothing more will come
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        ProbeOutcome::new(self.source, false)
    }
}
