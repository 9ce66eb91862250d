//! End-to-end detection scenarios exercising the coordinator with real
//! locator/analyzer components over a temporary filesystem, driving the
//! probes from canned observation text.

use dzhunt::analyze::ToolAnalyzer;
use dzhunt::detector::Detector;
use dzhunt::locate::FsLocator;
use dzhunt::models::{DetectorConfig, ProbeSource};
use dzhunt::probes::{PollProbe, Probe, StreamProbe};
use dzhunt::stimulus::SampleStimulus;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SIGNATURE: &str = "libdz.dylib";

fn fast_config(search_root: &TempDir, output_dir: &TempDir, max_rounds: u64) -> DetectorConfig {
    DetectorConfig {
        search_root: search_root.path().to_path_buf(),
        output_dir: output_dir.path().to_path_buf(),
        backoff: Duration::from_millis(20),
        max_rounds: Some(max_rounds),
        poll_interval: Duration::from_millis(10),
        probe_window: Duration::from_millis(300),
        locate_timeout: Duration::from_secs(10),
        ..DetectorConfig::default()
    }
}

fn process_table_probe(text: &'static str) -> Box<dyn Probe> {
    Box::new(PollProbe::with_snapshot(
        ProbeSource::ProcessTable,
        SIGNATURE,
        Duration::from_millis(10),
        Duration::from_millis(300),
        Box::new(move || Ok(text.to_string())),
    ))
}

fn quiet_stream_probe(source: ProbeSource) -> Box<dyn Probe> {
    Box::new(StreamProbe::with_command(
        source,
        SIGNATURE,
        Duration::from_millis(300),
        "/bin/sh",
        vec!["-c".to_string(), "printf 'open /tmp/benign\\n'".to_string()],
    ))
}

#[test]
fn process_table_match_ends_in_an_evidence_copy() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    // The artifact sits on disk where the locator will search
    let planted = root.path().join("libdz.dylib");
    fs::write(&planted, b"planted dylib bytes").unwrap();

    let config = fast_config(&root, &out, 3);
    let locator = FsLocator::new(root.path(), SIGNATURE, Duration::from_secs(10));
    let analyzer = ToolAnalyzer::with_tools(SIGNATURE, out.path(), "/bin/echo", "/bin/echo");

    let detector = Detector::with_parts(
        config,
        Arc::new(AtomicBool::new(false)),
        vec![process_table_probe(
            "666 evil /usr/bin/evil -inject libdz.dylib",
        )],
        SampleStimulus::with_command("/nonexistent/sample", vec![]),
        Box::new(locator),
        Box::new(analyzer),
    );

    let output = detector.run();

    assert!(detector.signal().is_set());
    assert_eq!(output.summary.rounds, 1);
    assert_eq!(output.reports.len(), 1);
    assert_eq!(output.reports[0].path, planted);
    assert!(!output.reports[0].hidden);

    // The evidence copy landed under the canonical name
    let copy = out.path().join(SIGNATURE);
    assert_eq!(output.reports[0].copied_to.as_deref(), Some(copy.as_path()));
    assert_eq!(fs::read(&copy).unwrap(), b"planted dylib bytes");
}

#[test]
fn all_probes_miss_and_stimulus_failure_still_completes_the_rounds() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let config = fast_config(&root, &out, 2);
    let locator = FsLocator::new(root.path(), SIGNATURE, Duration::from_secs(10));
    let analyzer = ToolAnalyzer::with_tools(SIGNATURE, out.path(), "/bin/echo", "/bin/echo");

    let probes: Vec<Box<dyn Probe>> = vec![
        process_table_probe("1 launchd /sbin/launchd"),
        quiet_stream_probe(ProbeSource::FileSystemTrace),
        quiet_stream_probe(ProbeSource::SyscallTrace),
    ];

    let detector = Detector::with_parts(
        config,
        Arc::new(AtomicBool::new(false)),
        probes,
        // Tool-not-found stimulus must not fail the round
        SampleStimulus::with_command("/nonexistent/sample", vec![]),
        Box::new(locator),
        Box::new(analyzer),
    );

    let output = detector.run();

    assert!(!detector.signal().is_set());
    assert_eq!(output.summary.rounds, 2);
    assert!(output.reports.is_empty());
    assert!(output.summary.interrupted.is_none());
    // No copy was produced
    assert!(!out.path().join(SIGNATURE).exists());
}

#[test]
fn hidden_variant_on_disk_is_located_and_flagged() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let hidden = root.path().join(".libdz.dylib");
    fs::write(&hidden, b"hidden copy").unwrap();

    let config = fast_config(&root, &out, 2);
    let detector = Detector::with_parts(
        config,
        Arc::new(AtomicBool::new(false)),
        vec![process_table_probe("42 loader dlopen .libdz.dylib")],
        SampleStimulus::with_command("/nonexistent/sample", vec![]),
        Box::new(FsLocator::new(root.path(), SIGNATURE, Duration::from_secs(10))),
        Box::new(ToolAnalyzer::with_tools(
            SIGNATURE,
            out.path(),
            "/bin/echo",
            "/bin/echo",
        )),
    );

    let output = detector.run();

    assert_eq!(output.reports.len(), 1);
    assert_eq!(output.reports[0].path, hidden);
    assert!(output.reports[0].hidden);
    // Evidence copy still lands under the canonical, unhidden name
    assert_eq!(
        output.reports[0].copied_to,
        Some(out.path().join(SIGNATURE))
    );
}

#[test]
fn streaming_probe_drives_the_full_pipeline() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let planted = root.path().join("libdz.dylib");
    fs::write(&planted, b"x").unwrap();

    // A scripted tracer that emits the signature mid-stream
    let tracer: Box<dyn Probe> = Box::new(StreamProbe::with_command(
        ProbeSource::FileSystemTrace,
        SIGNATURE,
        Duration::from_secs(5),
        "/bin/sh",
        vec![
            "-c".to_string(),
            "printf 'open /etc/hosts\\nopen /usr/local/lib/libdz.dylib\\n'; sleep 60".to_string(),
        ],
    ));

    let config = fast_config(&root, &out, 2);
    let detector = Detector::with_parts(
        config,
        Arc::new(AtomicBool::new(false)),
        vec![tracer],
        SampleStimulus::with_command("/nonexistent/sample", vec![]),
        Box::new(FsLocator::new(root.path(), SIGNATURE, Duration::from_secs(10))),
        Box::new(ToolAnalyzer::with_tools(
            SIGNATURE,
            out.path(),
            "/bin/echo",
            "/bin/echo",
        )),
    );

    let output = detector.run();

    assert_eq!(output.summary.rounds, 1);
    assert_eq!(
        output.reports.iter().map(|r| r.path.clone()).collect::<Vec<PathBuf>>(),
        vec![planted]
    );
}
