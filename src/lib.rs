//! dzhunt - libdz.dylib detection library
//!
//! Exposes the detection coordinator, probes, locator and analyzer so they
//! can be exercised directly by integration tests and embedding tools.

#![forbid(unsafe_code)]

pub mod analyze;
pub mod cli;
pub mod constants;
pub mod detector;
pub mod locate;
pub mod logging;
pub mod models;
pub mod output;
pub mod probes;
pub mod signal;
pub mod stimulus;
