//! `pipeline-impact` library crate.
//!
//! The binary (`pipeline-impact`) is a thin wrapper around this library so that:
//!
//! - loaders and estimators are testable without spawning processes
//! - the report and the figures can be produced from the same computed state

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod emissions;
pub mod error;
pub mod estimate;
pub mod io;
pub mod math;
pub mod panel;
pub mod plot;
pub mod report;
