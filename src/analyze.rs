//! Post-detection analyzer
//!
//! For each located artifact: verify its code signature with codesign,
//! enumerate its linked libraries with otool, and preserve an evidence copy
//! under the canonical name in the output directory. The three steps are
//! independent; a failing inspector or an unreadable file never stops the
//! other steps from running.

use crate::constants;
use crate::models::{AnalysisReport, ArtifactLocation, ToolError};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Produces an AnalysisReport for one located artifact.
pub trait Analyze: Send {
    fn analyze(&self, location: &ArtifactLocation) -> AnalysisReport;
}

/// Inspector-tool-backed analyzer. Tool names are constructor parameters so
/// tests can substitute scripted stand-ins for codesign and otool.
pub struct ToolAnalyzer {
    signature: String,
    output_dir: PathBuf,
    codesign: String,
    otool: String,
}

impl ToolAnalyzer {
    pub fn new(signature: &str, output_dir: &Path) -> Self {
        Self::with_tools(
            signature,
            output_dir,
            constants::CODESIGN_TOOL,
            constants::OTOOL_TOOL,
        )
    }

    pub fn with_tools(signature: &str, output_dir: &Path, codesign: &str, otool: &str) -> Self {
        Self {
            signature: signature.to_string(),
            output_dir: output_dir.to_path_buf(),
            codesign: codesign.to_string(),
            otool: otool.to_string(),
        }
    }

    /// Run codesign in diagnostic mode, capturing stdout and stderr combined
    /// since codesign writes its verdict to stderr.
    fn inspect_signature(&self, path: &Path) -> Result<String, ToolError> {
        let output = Command::new(&self.codesign)
            .arg("-dv")
            .arg("--verbose=4")
            .arg(path)
            .output()
            .map_err(|source| ToolError::Unavailable {
                tool: self.codesign.clone(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            // An unsigned or ad-hoc binary is itself a finding; log the
            // diagnostics and surface the failure to the caller.
            error!(
                "codesign reported an error for {}:\n{}",
                path.display(),
                text.trim_end()
            );
            return Err(ToolError::Failed {
                tool: self.codesign.clone(),
                status: output.status,
            });
        }

        Ok(text)
    }

    /// Run the dependency inspector and parse its indented listing into the
    /// ordered sequence of linked library paths.
    fn inspect_dependencies(&self, path: &Path) -> Result<Vec<String>, ToolError> {
        let output = Command::new(&self.otool)
            .arg("-L")
            .arg(path)
            .output()
            .map_err(|source| ToolError::Unavailable {
                tool: self.otool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.otool.clone(),
                status: output.status,
            });
        }

        Ok(parse_dependency_listing(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Preserve an evidence copy under the canonical name, overwriting any
    /// prior copy.
    fn copy_artifact(&self, path: &Path) -> std::io::Result<PathBuf> {
        let destination = self.output_dir.join(&self.signature);
        std::fs::copy(path, &destination)?;
        Ok(destination)
    }
}

impl Analyze for ToolAnalyzer {
    fn analyze(&self, location: &ArtifactLocation) -> AnalysisReport {
        let path = &location.path;
        info!("analyzing {}", path.display());

        let signature_info = match self.inspect_signature(path) {
            Ok(text) => {
                info!("codesign output for {}:\n{}", path.display(), text.trim_end());
                Some(text)
            }
            Err(err) => {
                error!("signature inspection failed for {}: {err}", path.display());
                None
            }
        };

        let dependencies = match self.inspect_dependencies(path) {
            Ok(deps) => {
                info!(
                    "{} links {} libraries",
                    path.display(),
                    deps.len()
                );
                deps
            }
            Err(err) => {
                error!("dependency inspection failed for {}: {err}", path.display());
                Vec::new()
            }
        };

        let copied_to = match self.copy_artifact(path) {
            Ok(destination) => {
                info!("copied {} to {}", path.display(), destination.display());
                Some(destination)
            }
            Err(err) => {
                error!("could not copy {}: {err}", path.display());
                None
            }
        };

        AnalysisReport {
            path: path.clone(),
            hidden: location.hidden,
            signature_info,
            dependencies,
            copied_to,
        }
    }
}

/// Parse `otool -L` style output: a header line naming the binary, then one
/// indented line per linked library with trailing version metadata.
fn parse_dependency_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.split_whitespace().next().map(str::to_string)
        })
        .collect()
}
