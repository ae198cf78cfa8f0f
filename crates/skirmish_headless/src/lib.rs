//! Headless battle runner for balance testing and CI verification.
//!
//! Runs battles without any renderer attached and reports the outcome
//! as JSON. Two modes:
//!
//! - **run**: fight one scenario once and print a [`BattleReport`]
//! - **batch**: fight the same scenario across a range of seeds in
//!   parallel and aggregate win rates
//!
//! Logs go to stderr; stdout carries only report JSON, so output can
//! be piped straight into `jq` or a results archive.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use runner::{run_battle, BattleReport, DEFAULT_MAX_TICKS};
pub use scenario::{Placement, Scenario, ScenarioError};
