//! Shared test utilities for the skirmish workspace.
//!
//! - [`fixtures`] - canned sessions and the synthetic battle clock
//! - [`determinism`] - harness for verifying reproducible battles

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod determinism;
pub mod fixtures;

pub use fixtures::{Clock, FRAME_MS};
