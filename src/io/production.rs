//! Provincial production loader (Statistics Canada table 25-10-0063-01 export).
//!
//! Layout after dropping the 9 preamble lines:
//!
//! ```text
//! row 0: _, _, <Month Year>, <Month Year>, ...        month labels from column 2
//! row 2: _, _, <sask bbl>..., <alberta bbl>...        monthly barrel totals
//!              ^ col 2        ^ col 120
//! ```
//!
//! Saskatchewan occupies value columns `2..120`, Alberta `120..`. Both blocks
//! take their month label from the label row *by position within the block*:
//! block offset `i` is labelled by column `2 + i`. The export repeats the same
//! month sequence for each province, so this lines up.

use chrono::NaiveDate;

use crate::domain::{AnalysisConfig, MonthlyObservation, Province, YearMonth};
use crate::error::AppError;
use crate::io::grid::{Cell, RawGrid, read_csv_grid};
use crate::io::rows::{LoadSummary, SkipReason};

/// Marker used by the export for "not available".
pub const NO_DATA_MARKER: &str = "..";

/// Positional offsets of the production export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionLayout {
    pub skip_lines: usize,
    pub label_row: usize,
    pub value_row: usize,
    /// First column of both the labels and the Saskatchewan block.
    pub first_col: usize,
    /// First column of the Alberta block (end of Saskatchewan, exclusive).
    pub alberta_col: usize,
}

impl Default for ProductionLayout {
    fn default() -> Self {
        Self {
            skip_lines: 9,
            label_row: 0,
            value_row: 2,
            first_col: 2,
            alberta_col: 120,
        }
    }
}

/// Loaded production series for both provinces.
#[derive(Debug, Clone, Default)]
pub struct ProductionData {
    pub alberta: Vec<MonthlyObservation>,
    pub saskatchewan: Vec<MonthlyObservation>,
    pub alberta_summary: LoadSummary,
    pub saskatchewan_summary: LoadSummary,
}

impl ProductionData {
    pub fn series(&self, province: Province) -> &[MonthlyObservation] {
        match province {
            Province::Alberta => &self.alberta,
            Province::Saskatchewan => &self.saskatchewan,
        }
    }
}

/// Read and parse the production file named in `config`.
pub fn load_production(config: &AnalysisConfig) -> Result<ProductionData, AppError> {
    let layout = ProductionLayout::default();
    let grid = read_csv_grid(&config.production_path(), layout.skip_lines)?;
    let data = parse_production_grid(&grid, &layout, config);
    data.saskatchewan_summary.log("production/saskatchewan");
    data.alberta_summary.log("production/alberta");
    Ok(data)
}

/// Interpret a production grid (preamble already removed).
pub fn parse_production_grid(
    grid: &RawGrid,
    layout: &ProductionLayout,
    config: &AnalysisConfig,
) -> ProductionData {
    let labels: &[Cell] = grid
        .row(layout.label_row)
        .map(|r| r.get(layout.first_col..).unwrap_or(&[]))
        .unwrap_or(&[]);
    let values: &[Cell] = grid.row(layout.value_row).unwrap_or(&[]);

    let sask_end = layout.alberta_col.min(values.len());
    let sask_values = values.get(layout.first_col..sask_end).unwrap_or(&[]);
    let alberta_values = values.get(layout.alberta_col..).unwrap_or(&[]);

    let (saskatchewan, saskatchewan_summary) =
        parse_block(Province::Saskatchewan, labels, sask_values, config);
    let (alberta, alberta_summary) = parse_block(Province::Alberta, labels, alberta_values, config);

    ProductionData {
        alberta,
        saskatchewan,
        alberta_summary,
        saskatchewan_summary,
    }
}

fn parse_block(
    province: Province,
    labels: &[Cell],
    values: &[Cell],
    config: &AnalysisConfig,
) -> (Vec<MonthlyObservation>, LoadSummary) {
    let mut out = Vec::new();
    let mut summary = LoadSummary::default();

    for (i, value) in values.iter().enumerate() {
        match parse_cell_pair(province, labels.get(i), value, config) {
            Ok(obs) => {
                summary.keep();
                out.push(obs);
            }
            Err(reason) => summary.skip(i, reason),
        }
    }

    (out, summary)
}

fn parse_cell_pair(
    province: Province,
    label: Option<&Cell>,
    value: &Cell,
    config: &AnalysisConfig,
) -> Result<MonthlyObservation, SkipReason> {
    let label = label
        .filter(|c| !c.is_empty())
        .ok_or(SkipReason::MissingLabel)?;
    let period = match label {
        Cell::Text(s) => parse_month_label(s).ok_or(SkipReason::BadLabel)?,
        _ => return Err(SkipReason::BadLabel),
    };

    if !config.in_year_window(period.year) {
        return Err(SkipReason::OutOfRange);
    }

    let barrels = parse_volume(value)?;

    Ok(MonthlyObservation {
        province,
        year: period.year,
        month: period.month,
        production_kbpd: barrels_to_kbpd(barrels, period),
    })
}

/// Parse a `"<Month name> <Year>"` label such as `"January 2018"`.
pub fn parse_month_label(label: &str) -> Option<YearMonth> {
    let date = NaiveDate::parse_from_str(&format!("01 {}", label.trim()), "%d %B %Y").ok()?;
    Some(YearMonth::from_date(date))
}

/// Inverse of [`parse_month_label`].
pub fn format_month_label(period: YearMonth) -> String {
    period.first_day().format("%B %Y").to_string()
}

/// Parse a monthly volume cell: numbers pass through, text may carry
/// thousands separators, and empty / `..` cells are "no data".
pub fn parse_volume(cell: &Cell) -> Result<f64, SkipReason> {
    match cell {
        Cell::Empty => Err(SkipReason::NoData),
        Cell::Number(v) if v.is_nan() => Err(SkipReason::NoData),
        Cell::Number(v) if v.is_finite() => Ok(*v),
        Cell::Number(_) => Err(SkipReason::BadNumber),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s == NO_DATA_MARKER {
                return Err(SkipReason::NoData);
            }
            let v: f64 = s.replace(',', "").parse().map_err(|_| SkipReason::BadNumber)?;
            if v.is_finite() { Ok(v) } else { Err(SkipReason::BadNumber) }
        }
    }
}

/// Monthly barrel total -> thousand barrels per day.
pub fn barrels_to_kbpd(barrels: f64, period: YearMonth) -> f64 {
    barrels / period.days_in_month() as f64 / 1000.0
}
