//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calendar keys and province tags (`YearMonth`, `Province`)
//! - loaded observations (`MonthlyObservation`, `RailObservation`, `PriceObservation`)
//! - the derived panel rows (`PanelRow`, `AlbertaRow`)
//! - the run configuration carrying every hand-calibrated constant (`AnalysisConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
