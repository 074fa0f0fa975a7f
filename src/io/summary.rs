//! JSON results summary.
//!
//! One file per analysis run holding every estimate the console report
//! prints, plus the configuration and loader outcomes that produced them.
//! Non-finite statistics are written as `null`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::AnalysisConfig;
use crate::emissions::EmissionsSummary;
use crate::error::AppError;
use crate::estimate::{DescriptiveDid, RegressionDid, TwoStageResult};
use crate::io::LoadSummary;

#[derive(Debug, Serialize)]
pub struct LoaderOutcomes<'a> {
    pub alberta: &'a LoadSummary,
    pub saskatchewan: &'a LoadSummary,
    pub rail: &'a LoadSummary,
}

#[derive(Debug, Serialize)]
pub struct ResultsFile<'a> {
    pub tool: &'static str,
    pub config: &'a AnalysisConfig,
    pub loaders: LoaderOutcomes<'a>,
    pub panel_rows: usize,
    pub descriptive_did: &'a DescriptiveDid,
    pub regression_did: &'a RegressionDid,
    pub two_stage: &'a TwoStageResult,
    pub emissions: &'a EmissionsSummary,
}

pub fn write_results_json(path: &Path, results: &ResultsFile<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create results JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, results)
        .map_err(|e| AppError::io(format!("Failed to write results JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush results JSON '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), "wrote results summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::price_observations;
    use crate::domain::{MonthlyObservation, Province};
    use crate::emissions::estimate_emissions;
    use crate::estimate::{descriptive_did, estimate_2sls, regression_did};
    use crate::panel::{build_panel, extend_alberta};

    /// Estimates over a synthetic seven-year panel.
    struct Estimates {
        config: AnalysisConfig,
        panel_rows: usize,
        descriptive: DescriptiveDid,
        regression: RegressionDid,
        two_stage: TwoStageResult,
        emissions: EmissionsSummary,
        empty: LoadSummary,
    }

    impl Estimates {
        fn new() -> Self {
            let config = AnalysisConfig::default();
            let series = |province, level: f64, slope: f64| -> Vec<MonthlyObservation> {
                (2018..=2024)
                    .flat_map(|y| (1..=12).map(move |m| (y, m)))
                    .enumerate()
                    .map(|(t, (year, month))| MonthlyObservation {
                        province,
                        year,
                        month,
                        production_kbpd: level + slope * t as f64 + ((t * 11) % 5) as f64,
                    })
                    .collect()
            };
            let panel = build_panel(
                &series(Province::Alberta, 3000.0, 5.0),
                &series(Province::Saskatchewan, 450.0, 0.5),
                &config,
            );
            let alberta = extend_alberta(&panel, &price_observations(), &[]);
            Self {
                descriptive: descriptive_did(&panel, &config.line3, &config.tmx).unwrap(),
                regression: regression_did(&panel).unwrap(),
                two_stage: estimate_2sls(&alberta, &config).unwrap(),
                emissions: estimate_emissions(&alberta, &config).unwrap(),
                panel_rows: panel.len(),
                empty: LoadSummary::default(),
                config,
            }
        }

        fn results(&self) -> ResultsFile<'_> {
            ResultsFile {
                tool: "pipeline-impact",
                config: &self.config,
                loaders: LoaderOutcomes {
                    alberta: &self.empty,
                    saskatchewan: &self.empty,
                    rail: &self.empty,
                },
                panel_rows: self.panel_rows,
                descriptive_did: &self.descriptive,
                regression_did: &self.regression,
                two_stage: &self.two_stage,
                emissions: &self.emissions,
            }
        }
    }

    #[test]
    fn summary_carries_every_section() {
        let estimates = Estimates::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_results_json(&path, &estimates.results()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "pipeline-impact");
        assert_eq!(value["panel_rows"], 168);
        assert_eq!(value["descriptive_did"]["line3"]["event"], "Line 3");
        assert!(value["regression_did"]["line3"]["estimate"].is_number());
        assert_eq!(value["two_stage"]["effects"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(value["emissions"]["intensity"].as_array().map(|a| a.len()), Some(7));
        assert!(value["two_stage"].get("rows").is_none());
    }

    #[test]
    fn write_errors_at_flush_are_reported() {
        // /dev/full accepts the open and fails every write with ENOSPC.
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let err = write_results_json(full, &Estimates::new().results()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
    }
}
