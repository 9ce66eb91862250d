//! Artifact locator
//!
//! Timeout-bounded filesystem-wide search for the artifact under its
//! canonical and hidden (dot-prefixed) filenames. Built on the external
//! `find` tool with stdout drained by a collector thread and a deadline
//! enforced by polling the child, killing it on overrun. Every failure mode
//! maps to an empty result; nothing is raised past this boundary.

use crate::constants;
use crate::models::{ArtifactLocation, ToolError};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Locates every on-disk copy of the artifact under a search root.
pub trait Locate: Send {
    fn locate(&self) -> Vec<ArtifactLocation>;
}

/// `find`-backed locator searching for the signature and its hidden variant.
pub struct FsLocator {
    root: PathBuf,
    signature: String,
    timeout: Duration,
}

impl FsLocator {
    pub fn new(root: &Path, signature: &str, timeout: Duration) -> Self {
        Self {
            root: root.to_path_buf(),
            signature: signature.to_string(),
            timeout,
        }
    }

    fn run_find(&self) -> Result<String, ToolError> {
        let tool = constants::FIND_TOOL;
        let hidden_name = format!(".{}", self.signature);
        let mut child = Command::new(tool)
            .arg(&self.root)
            .arg("-name")
            .arg(&self.signature)
            .arg("-o")
            .arg("-name")
            .arg(&hidden_name)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ToolError::Unavailable {
                tool: tool.to_string(),
                source,
            })?;

        // Drain stdout off-thread so a large result set cannot deadlock the
        // deadline loop on a full pipe.
        let stdout = child.stdout.take();
        let collector = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut stdout) = stdout {
                use std::io::Read;
                let _ = stdout.read_to_string(&mut text);
            }
            text
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let text = collector.join().unwrap_or_default();
                    // find exits non-zero over unreadable directories while
                    // still printing every hit; keep whatever it found.
                    if !status.success() && text.is_empty() {
                        return Err(ToolError::Failed {
                            tool: tool.to_string(),
                            status,
                        });
                    }
                    return Ok(text);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ToolError::Timeout {
                            tool: tool.to_string(),
                            budget: self.timeout,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::Unavailable {
                        tool: tool.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

impl Locate for FsLocator {
    fn locate(&self) -> Vec<ArtifactLocation> {
        info!(
            "searching {} for {} (including hidden variant)",
            self.root.display(),
            self.signature
        );

        match self.run_find() {
            Ok(output) => {
                let locations: Vec<ArtifactLocation> = output
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(|line| ArtifactLocation::new(PathBuf::from(line)))
                    .collect();
                if locations.is_empty() {
                    info!("{} not found in the file system", self.signature);
                } else {
                    for location in &locations {
                        info!("{} found at {}", self.signature, location.path.display());
                    }
                }
                locations
            }
            Err(err) => {
                error!("artifact search failed: {err}");
                Vec::new()
            }
        }
    }
}
