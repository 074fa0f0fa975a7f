//! Command-line parsing for the pipeline impact analysis.
//!
//! Parsing stays here; everything numeric lives in `AnalysisConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::AnalysisConfig;
use crate::plot::ScenarioKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pipeline-impact",
    version,
    about = "Oil pipeline impact analysis: DiD, 2SLS and upstream emissions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the input files, run DiD, 2SLS and emissions, and write outputs.
    Analyze(AnalyzeArgs),
    /// Render the fixed-value waterfall figures.
    Waterfall(WaterfallArgs),
    /// `analyze` followed by both waterfall figures.
    All(AnalyzeArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Directory holding the production CSV and the rail workbook.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory the CSV, JSON and PNG outputs are written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Skip the time-series figure.
    #[arg(long)]
    pub no_plots: bool,
}

impl AnalyzeArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            data_dir: self.data_dir.clone(),
            out_dir: self.out_dir.clone(),
            plots: !self.no_plots,
            ..AnalysisConfig::default()
        }
    }
}

/// Which waterfall figure(s) to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Detailed,
    Corrected,
    Both,
}

impl Scenario {
    pub fn kinds(self) -> &'static [ScenarioKind] {
        match self {
            Scenario::Detailed => &[ScenarioKind::Detailed],
            Scenario::Corrected => &[ScenarioKind::Corrected],
            Scenario::Both => &ScenarioKind::ALL,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct WaterfallArgs {
    #[arg(long, value_enum, default_value_t = Scenario::Both)]
    pub scenario: Scenario,

    /// Directory the PNG files are written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}
