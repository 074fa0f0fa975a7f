//! Crude-by-rail export loader (CER monthly workbook, first sheet).
//!
//! Columns are positional: `B` = year, `C` = month name, `G` = barrels/day.
//! The year is only written on the first row of each year (merged-cell
//! style), so the loader carries the last seen year forward.
//!
//! Volumes are national: there is no province split in this source.

use crate::domain::{AnalysisConfig, RailObservation};
use crate::error::AppError;
use crate::io::grid::{Cell, RawGrid, read_xlsx_grid};
use crate::io::rows::{LoadSummary, SkipReason};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Column offsets of the rail workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailLayout {
    pub year_col: usize,
    pub month_col: usize,
    pub value_col: usize,
}

impl Default for RailLayout {
    fn default() -> Self {
        Self {
            year_col: 1,
            month_col: 2,
            value_col: 6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RailData {
    pub observations: Vec<RailObservation>,
    pub summary: LoadSummary,
}

/// Read and parse the rail workbook named in `config`.
pub fn load_rail(config: &AnalysisConfig) -> Result<RailData, AppError> {
    let grid = read_xlsx_grid(&config.rail_path())?;
    let data = parse_rail_grid(&grid, &RailLayout::default(), config);
    data.summary.log("rail");
    Ok(data)
}

/// Map a full English month name to its number.
pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

pub fn parse_rail_grid(grid: &RawGrid, layout: &RailLayout, config: &AnalysisConfig) -> RailData {
    let mut observations = Vec::new();
    let mut summary = LoadSummary::default();
    let mut current_year: Option<i32> = None;

    for row in 0..grid.n_rows() {
        if let Some(y) = grid.get(row, layout.year_col).as_number() {
            current_year = Some(y as i32);
        }

        match parse_row(grid, row, layout, current_year, config) {
            Ok(obs) => {
                summary.keep();
                observations.push(obs);
            }
            Err(reason) => summary.skip(row, reason),
        }
    }

    RailData {
        observations,
        summary,
    }
}

fn parse_row(
    grid: &RawGrid,
    row: usize,
    layout: &RailLayout,
    current_year: Option<i32>,
    config: &AnalysisConfig,
) -> Result<RailObservation, SkipReason> {
    let month_cell = grid.get(row, layout.month_col);
    if month_cell.is_empty() {
        return Err(SkipReason::MissingLabel);
    }
    let month = month_cell
        .as_text()
        .and_then(month_number)
        .ok_or(SkipReason::UnknownMonth)?;
    let year = current_year.ok_or(SkipReason::NoYear)?;

    let bbl_per_day = match grid.get(row, layout.value_col) {
        c if c.is_empty() => return Err(SkipReason::NoData),
        Cell::Number(v) => *v,
        Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| SkipReason::BadNumber)?,
        Cell::Empty => return Err(SkipReason::NoData),
    };
    if !bbl_per_day.is_finite() {
        return Err(SkipReason::BadNumber);
    }

    if !config.in_year_window(year) {
        return Err(SkipReason::OutOfRange);
    }

    Ok(RailObservation {
        year,
        month,
        rail_kbpd: bbl_per_day / 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: Cell, month: &str, value: Cell) -> Vec<Cell> {
        vec![
            Cell::Empty,
            year,
            Cell::from(month),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            value,
        ]
    }

    #[test]
    fn year_carries_forward_across_month_rows() {
        let grid = RawGrid::new(vec![
            row(Cell::from("Year"), "Month", Cell::from("Barrels per day")),
            row(Cell::Number(2017.0), "December", Cell::Number(150_000.0)),
            row(Cell::Number(2018.0), "January", Cell::Number(200_000.0)),
            row(Cell::Empty, "February", Cell::Number(250_000.0)),
            row(Cell::Empty, "Total", Cell::Number(999_999.0)),
            row(Cell::Empty, "March", Cell::Empty),
        ]);
        let data = parse_rail_grid(&grid, &RailLayout::default(), &AnalysisConfig::default());

        assert_eq!(data.observations.len(), 2);
        assert_eq!(data.observations[0].year, 2018);
        assert_eq!(data.observations[0].month, 1);
        assert!((data.observations[0].rail_kbpd - 200.0).abs() < 1e-12);
        assert_eq!(data.observations[1].year, 2018);
        assert_eq!(data.observations[1].month, 2);

        let s = &data.summary;
        assert_eq!(s.rows_read, 6);
        assert_eq!(s.skipped_for(SkipReason::UnknownMonth), 2);
        assert_eq!(s.skipped_for(SkipReason::OutOfRange), 1);
        assert_eq!(s.skipped_for(SkipReason::NoData), 1);
    }

    #[test]
    fn month_rows_before_any_year_are_skipped() {
        let grid = RawGrid::new(vec![row(Cell::Empty, "January", Cell::Number(1.0))]);
        let data = parse_rail_grid(&grid, &RailLayout::default(), &AnalysisConfig::default());
        assert!(data.observations.is_empty());
        assert_eq!(data.summary.skipped_for(SkipReason::NoYear), 1);
    }

    #[test]
    fn years_after_the_window_are_dropped() {
        let grid = RawGrid::new(vec![
            row(Cell::Number(2024.0), "December", Cell::Number(80_000.0)),
            row(Cell::Number(2025.0), "January", Cell::Number(90_000.0)),
        ]);
        let data = parse_rail_grid(&grid, &RailLayout::default(), &AnalysisConfig::default());
        assert_eq!(data.observations.len(), 1);
        assert!(data.observations.iter().all(|o| (2018..=2024).contains(&o.year)));
    }

    #[test]
    fn month_names_map_to_numbers() {
        assert_eq!(month_number("January"), Some(1));
        assert_eq!(month_number("December"), Some(12));
        assert_eq!(month_number("Sept"), None);
        assert_eq!(month_number("january"), None);
    }
}
