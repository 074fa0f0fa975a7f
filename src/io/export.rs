//! CSV dumps of the working tables.
//!
//! Column order and names are fixed so the files can be diffed across runs
//! and opened directly in spreadsheets. Missing values are written as empty
//! cells.

use std::path::Path;

use serde::Serialize;

use crate::domain::PanelRow;
use crate::error::AppError;
use crate::estimate::IvRow;

/// One line of `pipeline_complete_panel.csv`.
#[derive(Debug, Serialize)]
struct PanelRecord<'a> {
    year: i32,
    month: u32,
    production_kbpd: f64,
    province: &'a str,
    date: String,
    treated: u8,
    line3_post: u8,
    tmx_post: u8,
    line3_did: u8,
    tmx_did: u8,
    time_trend: usize,
    pipeline_capacity_instrument: f64,
}

impl<'a> From<&'a PanelRow> for PanelRecord<'a> {
    fn from(r: &'a PanelRow) -> Self {
        Self {
            year: r.year,
            month: r.month,
            production_kbpd: r.production_kbpd,
            province: r.province.display_name(),
            date: r.period().first_day().format("%Y-%m-%d").to_string(),
            treated: r.treated,
            line3_post: r.line3_post,
            tmx_post: r.tmx_post,
            line3_did: r.line3_did,
            tmx_did: r.tmx_did,
            time_trend: r.time_trend,
            pipeline_capacity_instrument: r.pipeline_capacity_instrument,
        }
    }
}

/// One line of `pipeline_alberta_2sls.csv`: the panel columns plus the joined
/// price/rail columns and the first-stage prediction.
///
/// Spelled out rather than flattened; the csv serializer only accepts flat structs.
#[derive(Debug, Serialize)]
struct AlbertaRecord<'a> {
    year: i32,
    month: u32,
    production_kbpd: f64,
    province: &'a str,
    date: String,
    treated: u8,
    line3_post: u8,
    tmx_post: u8,
    line3_did: u8,
    tmx_did: u8,
    time_trend: usize,
    pipeline_capacity_instrument: f64,
    wcs_wti_differential: f64,
    rail_kbpd: Option<f64>,
    differential_predicted: f64,
}

impl<'a> From<&'a IvRow> for AlbertaRecord<'a> {
    fn from(r: &'a IvRow) -> Self {
        let p = PanelRecord::from(&r.row.panel);
        Self {
            year: p.year,
            month: p.month,
            production_kbpd: p.production_kbpd,
            province: p.province,
            date: p.date,
            treated: p.treated,
            line3_post: p.line3_post,
            tmx_post: p.tmx_post,
            line3_did: p.line3_did,
            tmx_did: p.tmx_did,
            time_trend: p.time_trend,
            pipeline_capacity_instrument: p.pipeline_capacity_instrument,
            wcs_wti_differential: r.wcs_wti_differential,
            rail_kbpd: r.row.rail_kbpd,
            differential_predicted: r.differential_predicted,
        }
    }
}

fn write_records<T: Serialize>(path: &Path, records: impl IntoIterator<Item = T>) -> Result<usize, AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create CSV '{}': {e}", path.display())))?;

    let mut n = 0;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::io(format!("Failed to write CSV row to '{}': {e}", path.display())))?;
        n += 1;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush CSV '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), rows = n, "wrote csv");
    Ok(n)
}

/// Write the stacked panel, in panel order.
pub fn write_panel_csv(path: &Path, panel: &[PanelRow]) -> Result<usize, AppError> {
    write_records(path, panel.iter().map(PanelRecord::from))
}

/// Write the Alberta 2SLS working table, in panel order.
pub fn write_alberta_csv(path: &Path, rows: &[IvRow]) -> Result<usize, AppError> {
    write_records(path, rows.iter().map(AlbertaRecord::from))
}
