//! The three-panel analysis figure.
//!
//! Top: production by province with the two in-service dates marked.
//! Middle: actual vs first-stage predicted WCS-WTI differential.
//! Bottom: the declining intensity path against the old constant.
//!
//! All panels share a decimal-year x axis.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::palette;
use super::{canvas, dash_segments, figure_size, pt, render_error};
use crate::domain::{AnalysisConfig, IntensityPoint, PanelRow, Province};
use crate::error::AppError;
use crate::estimate::IvRow;

const FIGURE_INCHES: (f64, f64) = (14.0, 10.0);

/// Everything the figure draws, already in plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSeries {
    pub alberta: Vec<(f64, f64)>,
    pub saskatchewan: Vec<(f64, f64)>,
    pub differential: Vec<(f64, f64)>,
    pub predicted: Vec<(f64, f64)>,
    pub intensity: Vec<(f64, f64)>,
    pub constant_intensity: f64,
    /// `(label, x)` for each in-service date.
    pub events: Vec<(&'static str, f64)>,
}

fn sorted(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

impl AnalysisSeries {
    pub fn new(panel: &[PanelRow], iv_rows: &[IvRow], intensity: &[IntensityPoint], config: &AnalysisConfig) -> Self {
        let production = |province: Province| {
            sorted(
                panel
                    .iter()
                    .filter(|r| r.province == province)
                    .map(|r| (r.period().as_decimal_year(), r.production_kbpd))
                    .collect(),
            )
        };
        let x = |r: &IvRow| r.row.panel.period().as_decimal_year();

        Self {
            alberta: production(Province::Alberta),
            saskatchewan: production(Province::Saskatchewan),
            differential: sorted(iv_rows.iter().map(|r| (x(r), r.wcs_wti_differential)).collect()),
            predicted: sorted(iv_rows.iter().map(|r| (x(r), r.differential_predicted)).collect()),
            intensity: intensity.iter().map(|p| (p.year as f64, p.kg_per_bbl)).collect(),
            constant_intensity: config.constant_intensity,
            events: vec![
                (config.line3.name, config.line3.in_service.as_decimal_year()),
                (config.tmx.name, config.tmx.in_service.as_decimal_year()),
            ],
        }
    }

    /// Shared x range over every series, padded by a month on each side.
    pub fn x_range(&self) -> (f64, f64) {
        let xs = self
            .alberta
            .iter()
            .chain(&self.saskatchewan)
            .chain(&self.differential)
            .chain(&self.intensity)
            .map(|p| p.0);
        padded(xs, 1.0 / 12.0).unwrap_or((0.0, 1.0))
    }
}

/// `(min - pad, max + pad)` over finite values.
fn padded(values: impl Iterator<Item = f64>, pad: f64) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() && hi.is_finite() {
        let pad = if hi > lo { pad } else { pad.max(1.0) };
        Some((lo - pad, hi + pad))
    } else {
        None
    }
}

/// y range with 5% headroom on both sides.
fn y_range<'a>(series: impl IntoIterator<Item = &'a [(f64, f64)]>, extra: &[f64]) -> (f64, f64) {
    let ys: Vec<f64> = series
        .into_iter()
        .flat_map(|s| s.iter().map(|p| p.1))
        .chain(extra.iter().copied())
        .collect();
    let (lo, hi) = padded(ys.iter().copied(), 0.0).unwrap_or((0.0, 1.0));
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad, hi + pad)
}

pub fn render_analysis(series: &AnalysisSeries, config: &AnalysisConfig) -> Result<PathBuf, AppError> {
    let path = config.output_path(&config.analysis_png);
    draw_analysis(series, &path, config.dpi).map_err(|e| render_error(&path, e))?;
    tracing::info!(path = %path.display(), "saved analysis figure");
    Ok(path)
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw_analysis(series: &AnalysisSeries, path: &Path, dpi: u32) -> Result<(), Box<dyn Error>> {
    let root = canvas(path, figure_size(FIGURE_INCHES.0, FIGURE_INCHES.1, dpi))?;
    let panels = root.split_evenly((3, 1));
    let x_range = series.x_range();

    draw_production(&panels[0], series, x_range, dpi)?;
    draw_first_stage(&panels[1], series, x_range, dpi)?;
    draw_intensity(&panels[2], series, x_range, dpi)?;

    root.present()?;
    Ok(())
}

fn title_font(dpi: u32, size: f64) -> FontDesc<'static> {
    ("sans-serif", pt(size, dpi)).into_font().style(FontStyle::Bold)
}

fn draw_production(area: &Panel<'_>, s: &AnalysisSeries, (x0, x1): (f64, f64), dpi: u32) -> Result<(), Box<dyn Error>> {
    let (y0, y1) = y_range([s.alberta.as_slice(), s.saskatchewan.as_slice()], &[]);
    let mut chart = ChartBuilder::on(area)
        .caption(
            "Difference-in-Differences: Alberta (Treated) vs Saskatchewan (Control)",
            title_font(dpi, 14.0),
        )
        .margin(pt(8.0, dpi) as u32)
        .x_label_area_size(pt(18.0, dpi) as u32)
        .y_label_area_size(pt(56.0, dpi) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .y_desc("Production (kb/d)")
        .axis_desc_style(title_font(dpi, 12.0))
        .label_style(("sans-serif", pt(10.0, dpi)))
        .light_line_style(TRANSPARENT)
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    let width = pt(2.5, dpi).round() as u32;
    for (label, points, color) in [
        ("Alberta", &s.alberta, palette::BLUE),
        ("Saskatchewan", &s.saskatchewan, palette::GREEN),
    ] {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.mix(0.85).stroke_width(width)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
    }
    draw_event_markers(&mut chart, s, (y0, y1), dpi, true)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", pt(10.0, dpi)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_first_stage(area: &Panel<'_>, s: &AnalysisSeries, (x0, x1): (f64, f64), dpi: u32) -> Result<(), Box<dyn Error>> {
    let (y0, y1) = y_range([s.differential.as_slice(), s.predicted.as_slice()], &[]);
    let mut chart = ChartBuilder::on(area)
        .caption(
            "2SLS First Stage: Pipeline Capacity → WCS-WTI Differential",
            title_font(dpi, 12.0),
        )
        .margin(pt(8.0, dpi) as u32)
        .x_label_area_size(pt(18.0, dpi) as u32)
        .y_label_area_size(pt(56.0, dpi) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .y_desc("Differential ($/bbl)")
        .axis_desc_style(title_font(dpi, 12.0))
        .label_style(("sans-serif", pt(10.0, dpi)))
        .light_line_style(TRANSPARENT)
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    let width = pt(2.0, dpi).round() as u32;
    chart
        .draw_series(LineSeries::new(
            s.differential.iter().copied(),
            palette::PURPLE.mix(0.7).stroke_width(width),
        ))?
        .label("Actual WCS-WTI")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette::PURPLE.stroke_width(3)));

    let (dash, gap) = (0.08, 0.05);
    chart
        .draw_series(
            s.predicted
                .windows(2)
                .flat_map(|w| dash_segments(w[0], w[1], dash, gap))
                .map(|seg| PathElement::new(seg.to_vec(), palette::ORANGE.mix(0.8).stroke_width(width))),
        )?
        .label("Predicted (First Stage)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette::ORANGE.stroke_width(3)));

    draw_event_markers(&mut chart, s, (y0, y1), dpi, false)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", pt(10.0, dpi)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_intensity(area: &Panel<'_>, s: &AnalysisSeries, (x0, x1): (f64, f64), dpi: u32) -> Result<(), Box<dyn Error>> {
    let (y0, y1) = y_range([s.intensity.as_slice()], &[s.constant_intensity]);
    let mut chart = ChartBuilder::on(area)
        .caption("Emissions Intensity: ~2% Annual Decline", title_font(dpi, 12.0))
        .margin(pt(8.0, dpi) as u32)
        .x_label_area_size(pt(30.0, dpi) as u32)
        .y_label_area_size(pt(56.0, dpi) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Emissions Intensity (kg CO2e/bbl)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .axis_desc_style(title_font(dpi, 12.0))
        .label_style(("sans-serif", pt(10.0, dpi)))
        .light_line_style(TRANSPARENT)
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    let green = palette::GREEN;
    chart
        .draw_series(LineSeries::new(
            s.intensity.iter().copied(),
            green.stroke_width(pt(3.0, dpi).round() as u32),
        ))?
        .label("Declining Intensity")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], green.stroke_width(3)));
    chart.draw_series(
        s.intensity
            .iter()
            .map(|&p| Circle::new(p, pt(4.0, dpi) as u32, green.filled())),
    )?;

    // Dotted reference line.
    let level = s.constant_intensity;
    let dot = (x1 - x0) / 400.0;
    chart
        .draw_series(
            dash_segments((x0, level), (x1, level), dot, dot * 1.5)
                .into_iter()
                .map(|seg| PathElement::new(seg.to_vec(), palette::GRAY.stroke_width(pt(2.0, dpi).round() as u32))),
        )?
        .label(format!("Old Constant ({level:.0} kg/bbl)"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette::GRAY.stroke_width(3)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", pt(10.0, dpi)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Red dashed line at Line 3, orange at TMX.
fn draw_event_markers<DB>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    s: &AnalysisSeries,
    (y0, y1): (f64, f64),
    dpi: u32,
    with_legend: bool,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let width = pt(2.0, dpi).round() as u32;
    let dash = (y1 - y0) / 40.0;
    for (i, &(label, x)) in s.events.iter().enumerate() {
        let color = if i == 0 { palette::RED } else { palette::ORANGE };
        let drawn = chart.draw_series(
            dash_segments((x, y0), (x, y1), dash, dash * 0.6)
                .into_iter()
                .map(move |seg| PathElement::new(seg.to_vec(), color.mix(0.7).stroke_width(width))),
        )?;
        if with_legend {
            drawn
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
        }
    }
    Ok(())
}
