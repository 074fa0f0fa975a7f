//! Raw cell grids.
//!
//! Both input files are laid out for humans, not machines: headers sit at fixed
//! offsets, years are merged across rows, and numbers come with thousands
//! separators. We therefore read each file into an untyped grid first and let a
//! dedicated adapter (`production`, `rail`) interpret positions. Nothing
//! downstream ever sees a grid.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::AppError;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.trim()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.trim().to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

/// Row-major grid of cells. Rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> Option<&[Cell]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Cell at `(row, col)`, treating anything out of bounds as empty.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }
}

/// Read a header-less CSV into a grid, dropping the first `skip_lines` raw lines.
///
/// The preamble is skipped by line, blank lines included, before the CSV
/// reader sees the file. Blank lines after the preamble are ignored.
///
/// A missing file is the fatal "missing input" precondition (exit code 1).
pub fn read_csv_grid(path: &Path, skip_lines: usize) -> Result<RawGrid, AppError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::missing_input(path));
        }
        Err(e) => {
            return Err(AppError::io(format!(
                "Failed to open CSV '{}': {e}",
                path.display()
            )));
        }
    };

    let mut input = BufReader::new(file);
    let mut line = Vec::new();
    for _ in 0..skip_lines {
        line.clear();
        let n = input.read_until(b'\n', &mut line).map_err(|e| {
            AppError::io(format!("Failed to read CSV '{}': {e}", path.display()))
        })?;
        if n == 0 {
            break;
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::io(format!(
                "Failed to read CSV '{}' at record {}: {e}",
                path.display(),
                idx + 1
            ))
        })?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(RawGrid::new(rows))
}

/// Read the first worksheet of an Excel workbook into a grid.
///
/// Cells keep their absolute sheet positions: row 0 / column 0 is `A1` even
/// when the used range starts further in.
pub fn read_xlsx_grid(path: &Path) -> Result<RawGrid, AppError> {
    if !path.is_file() {
        return Err(AppError::missing_input(path));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::io(format!("Failed to open workbook '{}': {e}", path.display()))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::io(format!("Workbook '{}' has no sheets.", path.display())))?
        .map_err(|e| {
            AppError::io(format!(
                "Failed to read first sheet of '{}': {e}",
                path.display()
            ))
        })?;

    let Some((row0, col0)) = range.start() else {
        return Ok(RawGrid::default());
    };
    let Some((row1, col1)) = range.end() else {
        return Ok(RawGrid::default());
    };

    let mut rows = Vec::with_capacity((row1 + 1) as usize);
    for r in 0..=row1 {
        let mut row = Vec::with_capacity((col1 + 1) as usize);
        for c in 0..=col1 {
            let cell = if r < row0 || c < col0 {
                Cell::Empty
            } else {
                range.get_value((r, c)).map(cell_from_data).unwrap_or(Cell::Empty)
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(RawGrid::new(rows))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(s) => Cell::from(s.as_str()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        // Excel dates are not years or volumes in either layout we read.
        Data::DateTime(dt) => Cell::Text(format!("{dt:?}")),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn csv_grid_skips_leading_lines_and_keeps_quoted_commas() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "title").unwrap();
        writeln!(tmp, "subtitle").unwrap();
        writeln!(tmp, "a,b,January 2018").unwrap();
        writeln!(tmp, "x,y,\"1,234,567\"").unwrap();
        tmp.flush().unwrap();

        let grid = read_csv_grid(tmp.path(), 2).unwrap();
        assert_eq!(grid.n_rows(), 2);
        assert_eq!(grid.get(0, 2), &Cell::Text("January 2018".to_string()));
        assert_eq!(grid.get(1, 2), &Cell::Text("1,234,567".to_string()));
        assert_eq!(grid.get(5, 5), &Cell::Empty);
    }

    #[test]
    fn preamble_is_skipped_by_line_including_blank_lines() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "title").unwrap();
        writeln!(tmp, "subtitle").unwrap();
        writeln!(tmp).unwrap();
        writeln!(tmp, "\"Frequency: Monthly\"").unwrap();
        writeln!(tmp, "a,b,January 2018").unwrap();
        writeln!(tmp, "spacer").unwrap();
        writeln!(tmp, "x,y,100").unwrap();
        tmp.flush().unwrap();

        let grid = read_csv_grid(tmp.path(), 4).unwrap();
        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.get(0, 2), &Cell::Text("January 2018".to_string()));
        assert_eq!(grid.get(2, 2), &Cell::Text("100".to_string()));
    }

    #[test]
    fn skipping_past_the_end_gives_an_empty_grid() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "only line").unwrap();
        tmp.flush().unwrap();
        assert_eq!(read_csv_grid(tmp.path(), 9).unwrap().n_rows(), 0);
    }

    #[test]
    fn missing_csv_is_a_missing_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv_grid(&dir.path().join("nope.csv"), 9).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MISSING_INPUT);
    }

    #[test]
    fn workbook_cells_keep_absolute_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_number(1, 1, 2020.0).unwrap();
        sheet.write_string(2, 2, "March").unwrap();
        sheet.write_number(2, 6, 151_000.0).unwrap();
        workbook.save(&path).unwrap();

        let grid = read_xlsx_grid(&path).unwrap();
        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.get(0, 0), &Cell::Empty);
        assert_eq!(grid.get(1, 1), &Cell::Number(2020.0));
        assert_eq!(grid.get(2, 2), &Cell::Text("March".to_string()));
        assert_eq!(grid.get(2, 6).as_number(), Some(151_000.0));
        assert!(grid.get(1, 6).is_empty());
    }

    #[test]
    fn missing_workbook_is_a_missing_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_xlsx_grid(&dir.path().join("nope.xlsx")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MISSING_INPUT);
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(Cell::from("   ").is_empty());
        assert!(Cell::Number(f64::NAN).is_empty());
        assert!(!Cell::from("..").is_empty());
    }
}
