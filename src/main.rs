#![forbid(unsafe_code)]

use anyhow::{bail, Result};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use dzhunt::detector::Detector;
use dzhunt::{cli, logging, output};

fn main() -> Result<()> {
    let config = cli::parse_args()?;

    // Gate after parsing so --help and --version work anywhere
    if !cfg!(target_os = "macos") {
        bail!("dzhunt is intended for macOS systems");
    }
    if !nix::unistd::geteuid().is_root() {
        bail!("dzhunt must be run as root");
    }

    logging::init(config.use_uls)?;

    // Set up interrupt handling
    let interrupted = Arc::new(AtomicBool::new(false));
    let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone());
    let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone());

    if !config.quiet_mode {
        println!(
            "Hunting for {} (search root {}). Press Ctrl+C to stop.",
            config.signature,
            config.search_root.display()
        );
    }

    let json_output = config.json_output;
    let detector = Detector::new(config, interrupted);
    let result = detector.run();

    if json_output {
        println!("{}", output::format_json(&result)?);
    } else {
        output::format_human(&result)?;
    }

    if result.reports.is_empty() {
        // Interrupted or round limit exhausted without locating the artifact
        std::process::exit(1);
    }
    Ok(())
}
