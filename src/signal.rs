//! Shared detection signal and probe cancellation context
//!
//! The signal is the only mutable state shared across concurrent units.
//! Within a round it is monotonic: any probe may raise it, and raising it
//! twice is harmless. Only the coordinator clears it, between rounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide detection flag shared by all probes and the coordinator.
/// First writer wins; the write is idempotent so no lock is needed.
#[derive(Debug, Clone, Default)]
pub struct DetectionSignal {
    flag: Arc<AtomicBool>,
}

impl DetectionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Called by probes on a signature match.
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the signal between rounds. Coordinator only — probes never
    /// transition the signal back to false.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Everything a probe needs to decide whether to keep observing:
/// the shared detection signal plus the process-wide interrupt flag.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    signal: DetectionSignal,
    interrupted: Arc<AtomicBool>,
}

impl ProbeContext {
    pub fn new(signal: DetectionSignal, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            signal,
            interrupted,
        }
    }

    /// Raise the detection signal on behalf of a matching probe.
    pub fn report_match(&self) {
        self.signal.set();
    }

    /// Cooperative cancellation check. Probes call this at every loop
    /// iteration: a sibling's match or a user interrupt both end the probe.
    pub fn should_stop(&self) -> bool {
        self.signal.is_set() || self.interrupted.load(Ordering::Relaxed)
    }
}
