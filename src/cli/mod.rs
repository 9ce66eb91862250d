//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Signature name and search root overrides
//! - Round limit and backoff tuning
//! - Output format selection (human/JSON)
//! - Unified Logging and quiet modes

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;
use crate::models::DetectorConfig;

fn command() -> Command {
    Command::new("dzhunt")
        .version(env!("CARGO_PKG_VERSION"))
        .allow_negative_numbers(true)
        .about("Detect, locate and analyze the libdz.dylib dynamic library")
        .long_about(
            "Races lsof, fs_usage, dtrace and process-table probes against a shared \
             detection signal while sampling launchd to provoke library loading, then \
             locates the artifact on disk and inspects it with codesign and otool.",
        )
        .arg(
            Arg::new("signature")
                .short('s')
                .long("signature")
                .value_name("NAME")
                .help("Artifact filename to hunt for")
                .default_value(constants::SIGNATURE_NAME),
        )
        .arg(
            Arg::new("search-root")
                .short('r')
                .long("search-root")
                .value_name("PATH")
                .help("Root of the filesystem search for the located artifact")
                .default_value("/"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("PATH")
                .help("Directory the evidence copy is written into")
                .default_value("."),
        )
        .arg(
            Arg::new("max-rounds")
                .long("max-rounds")
                .value_name("N")
                .help("Give up after N detection rounds (default: run until detection)")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("backoff")
                .long("backoff")
                .value_name("SECS")
                .help("Pause between rounds when nothing was detected")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output the final report in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress progress output on stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("uls")
                .long("uls")
                .help("Log to macOS Unified Logging instead of stderr")
                .action(ArgAction::SetTrue),
        )
}

fn config_from_matches(matches: &ArgMatches) -> Result<DetectorConfig> {
    let mut config = DetectorConfig::default();

    if let Some(signature) = matches.get_one::<String>("signature") {
        if signature.is_empty() || signature.contains('/') {
            return Err(anyhow!("signature must be a bare filename: {signature}"));
        }
        config.signature = signature.clone();
    }

    if let Some(root) = matches.get_one::<String>("search-root") {
        let path = Path::new(root);
        if !path.is_dir() {
            return Err(anyhow!("search root does not exist: {root}"));
        }
        config.search_root = path.to_path_buf();
    }

    if let Some(dir) = matches.get_one::<String>("output-dir") {
        let path = PathBuf::from(dir);
        if !path.is_dir() {
            return Err(anyhow!("output directory does not exist: {dir}"));
        }
        config.output_dir = path;
    }

    config.max_rounds = matches.get_one::<u64>("max-rounds").copied();

    if let Some(backoff) = matches.get_one::<f64>("backoff") {
        if !(*backoff >= 0.0 && *backoff <= 300.0) {
            return Err(anyhow!(
                "backoff must be between 0 and 300 seconds: {backoff}"
            ));
        }
        config.backoff = Duration::from_secs_f64(*backoff);
    }

    config.json_output = matches.get_flag("json");
    config.quiet_mode = matches.get_flag("quiet");
    config.use_uls = matches.get_flag("uls");

    Ok(config)
}

/// Parse command line arguments and return the run configuration
pub fn parse_args() -> Result<DetectorConfig> {
    let matches = command().get_matches();
    config_from_matches(&matches)
}
