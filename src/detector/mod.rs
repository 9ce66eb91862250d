//! Detection coordinator
//!
//! Runs detection rounds: the stimulus generator and all four probes race on
//! worker threads against the shared detection signal, the coordinator joins
//! them, then decides. A raised signal hands off to the locator and, for each
//! hit, the analyzer. A signal with no on-disk artifact resets for another
//! round; a quiet round backs off and retries. The loop is unbounded unless a
//! round limit is configured, and a user interrupt ends it in an orderly way.

use crate::analyze::{Analyze, ToolAnalyzer};
use crate::locate::{FsLocator, Locate};
use crate::models::{AnalysisReport, DetectionOutput, DetectorConfig, ProbeOutcome, RunSummary};
use crate::probes::{PollProbe, Probe, StreamProbe};
use crate::signal::{DetectionSignal, ProbeContext};
use crate::stimulus::SampleStimulus;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Supervises the multi-probe detection race and the locate/analyze handoff.
pub struct Detector {
    config: DetectorConfig,
    signal: DetectionSignal,
    interrupted: Arc<AtomicBool>,
    probes: Vec<Box<dyn Probe>>,
    stimulus: SampleStimulus,
    locator: Box<dyn Locate>,
    analyzer: Box<dyn Analyze>,
}

impl Detector {
    /// Build a detector with the production probe set and tools.
    pub fn new(config: DetectorConfig, interrupted: Arc<AtomicBool>) -> Self {
        let signature = config.signature.clone();
        let interval = config.poll_interval;
        let window = config.probe_window;

        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(PollProbe::open_files(&signature, interval, window)),
            Box::new(StreamProbe::fs_trace(&signature, window)),
            Box::new(StreamProbe::syscall_trace(&signature, window)),
            Box::new(PollProbe::process_table(&signature, interval, window)),
        ];
        let locator = Box::new(FsLocator::new(
            &config.search_root,
            &signature,
            config.locate_timeout,
        ));
        let analyzer = Box::new(ToolAnalyzer::new(&signature, &config.output_dir));

        Self {
            config,
            signal: DetectionSignal::new(),
            interrupted,
            probes,
            stimulus: SampleStimulus::new(),
            locator,
            analyzer,
        }
    }

    /// Build a detector from explicit parts. Used by tests that substitute
    /// scripted probes, locators and analyzers.
    pub fn with_parts(
        config: DetectorConfig,
        interrupted: Arc<AtomicBool>,
        probes: Vec<Box<dyn Probe>>,
        stimulus: SampleStimulus,
        locator: Box<dyn Locate>,
        analyzer: Box<dyn Analyze>,
    ) -> Self {
        Self {
            config,
            signal: DetectionSignal::new(),
            interrupted,
            probes,
            stimulus,
            locator,
            analyzer,
        }
    }

    pub fn signal(&self) -> &DetectionSignal {
        &self.signal
    }

    /// Run rounds until the artifact is located and analyzed, the configured
    /// round limit is exhausted, or the process is interrupted.
    pub fn run(&self) -> DetectionOutput {
        let started = Instant::now();
        let mut rounds = 0u64;
        let mut reports: Vec<AnalysisReport> = Vec::new();

        loop {
            if self.is_interrupted() {
                info!("interrupted; stopping detection");
                self.signal.reset();
                break;
            }

            rounds += 1;
            info!("starting detection round {rounds}");
            let outcomes = self.run_round();
            for outcome in &outcomes {
                info!(
                    "round {rounds}: {} probe {}",
                    outcome.source,
                    if outcome.matched { "matched" } else { "no match" }
                );
            }

            let detected = self.signal.is_set();
            if detected {
                let locations = self.locator.locate();
                if !locations.is_empty() {
                    reports = locations
                        .iter()
                        .map(|location| self.analyzer.analyze(location))
                        .collect();
                    break;
                }
                // Real race: memory-resident only, already deleted, or hidden
                // from the search. Reset and run another round.
                warn!(
                    "{} detection triggered but the artifact was not found on disk",
                    self.config.signature
                );
                self.signal.reset();
            } else {
                info!("{} not detected this round", self.config.signature);
            }

            if let Some(max) = self.config.max_rounds {
                if rounds >= max {
                    info!("round limit ({max}) reached without locating the artifact");
                    break;
                }
            }

            if !detected {
                self.sleep_backoff();
            }
        }

        let interrupted = self.is_interrupted();
        DetectionOutput {
            reports,
            summary: RunSummary {
                rounds,
                duration_ms: started.elapsed().as_millis() as u64,
                interrupted: if interrupted { Some(true) } else { None },
            },
        }
    }

    /// One round: stimulus plus all probes on scoped worker threads, joined
    /// before the decision step.
    fn run_round(&self) -> Vec<ProbeOutcome> {
        let ctx = ProbeContext::new(self.signal.clone(), self.interrupted.clone());
        let stimulus = &self.stimulus;

        std::thread::scope(|scope| {
            let stimulus = scope.spawn(move || stimulus.trigger());
            let workers: Vec<_> = self
                .probes
                .iter()
                .map(|probe| {
                    let ctx = ctx.clone();
                    let probe = probe.as_ref();
                    (probe.source(), scope.spawn(move || probe.run(&ctx)))
                })
                .collect();

            let _ = stimulus.join();
            workers
                .into_iter()
                .filter_map(|(source, worker)| match worker.join() {
                    Ok(outcome) => Some(outcome),
                    Err(_) => {
                        error!("{source} probe worker panicked; dropping its outcome");
                        None
                    }
                })
                .collect()
        })
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }

    /// Backoff between quiet rounds, sliced so an interrupt ends it early.
    fn sleep_backoff(&self) {
        info!(
            "retrying in {:.1}s",
            self.config.backoff.as_secs_f64()
        );
        let deadline = Instant::now() + self.config.backoff;
        while Instant::now() < deadline {
            if self.is_interrupted() {
                return;
            }
            std::thread::sleep(Duration::from_millis(50).min(self.config.backoff));
        }
    }
}
