//! Waterfall charts: pipeline oil volumes and the emissions offset.
//!
//! Both scenarios are presentation constants. They are drawn as given and
//! are not recomputed from the estimates; the two sets differ and are not
//! expected to reconcile.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use super::palette;
use super::{canvas, dash_segments, figure_size, pt, render_error};
use crate::error::AppError;

const BAR_WIDTH: f64 = 0.6;
const FIGURE_INCHES: (f64, f64) = (18.0, 6.0);

/// A callout arrow from `text_at` to `point_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub text: &'static str,
    pub point_at: (f64, f64),
    pub text_at: (f64, f64),
    pub color: RGBColor,
}

/// One waterfall panel.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallChart {
    pub title: &'static str,
    pub y_label: &'static str,
    pub categories: Vec<&'static str>,
    pub values: Vec<f64>,
    /// One fill per bar.
    pub colors: Vec<RGBColor>,
    pub y_range: (f64, f64),
    /// Decimals used for bar labels.
    pub decimals: usize,
    pub callouts: Vec<Callout>,
    /// Boxed note: text, anchor (x, y), box colour.
    pub note: Option<(&'static str, (f64, f64), RGBColor)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Detailed,
    Corrected,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 2] = [ScenarioKind::Detailed, ScenarioKind::Corrected];

    pub fn file_name(&self) -> &'static str {
        match self {
            ScenarioKind::Detailed => "pipeline_waterfall_charts_detailed.png",
            ScenarioKind::Corrected => "pipeline_waterfall_charts_corrected.png",
        }
    }

    pub fn scenario(&self) -> WaterfallScenario {
        match self {
            ScenarioKind::Detailed => WaterfallScenario::detailed(),
            ScenarioKind::Corrected => WaterfallScenario::corrected(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallScenario {
    pub kind: ScenarioKind,
    pub oil: WaterfallChart,
    pub emissions: WaterfallChart,
}

const OIL_VALUES: [f64; 6] = [0.0, 343.0, 201.0, 129.0, -18.0, 0.0];

impl WaterfallScenario {
    /// 2%/year technology offset, darker palette.
    pub fn detailed() -> Self {
        Self {
            kind: ScenarioKind::Detailed,
            oil: WaterfallChart {
                title: "Pipeline Impact: Production & Modal Shift by Pipeline",
                y_label: "Oil Volume (kb/d)",
                categories: vec![
                    "Baseline",
                    "Line 3\nProduction\n(Oct 2021)",
                    "TMX\nProduction\n(May 2024)",
                    "Rail Decline\n(Modal Shift)",
                    "Adjustments",
                    "Net Pipeline\nThroughput",
                ],
                values: OIL_VALUES.to_vec(),
                colors: vec![
                    palette::LIGHT_GRAY,
                    palette::DARK_BLUE,
                    palette::NAVY,
                    palette::STEEL_BLUE,
                    palette::ORANGE,
                    palette::DARK_GREEN,
                ],
                y_range: (-50.0, 750.0),
                decimals: 0,
                callouts: vec![
                    Callout {
                        text: "DiD Effect:\n+343 kb/d",
                        point_at: (1.0, 343.0 / 2.0),
                        text_at: (1.0, 400.0),
                        color: palette::DARK_BLUE,
                    },
                    Callout {
                        text: "DiD Effect:\n+201 kb/d",
                        point_at: (2.0, 343.0 + 201.0 / 2.0),
                        text_at: (2.0, 600.0),
                        color: palette::NAVY,
                    },
                ],
                note: None,
            },
            emissions: WaterfallChart {
                title: "Emissions Impact: Technology Offset by Pipeline",
                y_label: "Emissions (Mt CO2e/year)",
                categories: vec![
                    "Baseline",
                    "Line 3\n(Constant\nIntensity)",
                    "TMX\n(Constant\nIntensity)",
                    "Technology\nOffset\n(2%/year)",
                    "Net Upstream\nEmissions",
                ],
                values: vec![0.0, 8.4, 4.9, -8.3, 0.0],
                colors: vec![
                    palette::LIGHT_GRAY,
                    palette::DARK_RED,
                    palette::RED,
                    palette::GREEN,
                    palette::MAROON,
                ],
                y_range: (-2.0, 16.0),
                decimals: 1,
                callouts: Vec::new(),
                note: Some(("Actual:\nLine 3: 2.7 Mt\nTMX: 2.0 Mt", (3.5, 0.5), palette::LIGHT_GREEN)),
            },
        }
    }

    /// 1.3%/year technology offset, lighter palette.
    pub fn corrected() -> Self {
        Self {
            kind: ScenarioKind::Corrected,
            oil: WaterfallChart {
                title: "Pipeline impact: Production and modal shift by pipeline",
                y_label: "Oil volume (kb/d)",
                categories: vec![
                    "Baseline",
                    "Line 3\nproduction\n(Oct 2021)",
                    "TMX\nproduction\n(May 2024)",
                    "Rail decline\n(modal shift)",
                    "Adjustments",
                    "Net pipeline\nthroughput",
                ],
                values: OIL_VALUES.to_vec(),
                colors: vec![
                    palette::LIGHT_GRAY,
                    palette::CORNFLOWER_BLUE,
                    palette::ROYAL_BLUE,
                    palette::LIGHT_SKY_BLUE,
                    palette::PEACH_PUFF,
                    palette::FOREST_GREEN,
                ],
                y_range: (-50.0, 750.0),
                decimals: 0,
                callouts: vec![
                    Callout {
                        text: "DiD effect:\n+343 kb/d",
                        point_at: (1.0, 343.0 / 2.0),
                        text_at: (1.0, 420.0),
                        color: palette::NAVY,
                    },
                    Callout {
                        text: "DiD effect:\n+201 kb/d",
                        point_at: (2.0, 343.0 + 201.0 / 2.0),
                        text_at: (2.5, 600.0),
                        color: palette::NAVY,
                    },
                ],
                note: None,
            },
            emissions: WaterfallChart {
                title: "Emissions impact: Technology offset by pipeline",
                y_label: "Emissions (Mt CO2e/year)",
                categories: vec![
                    "Baseline",
                    "Line 3\n(constant\nintensity)",
                    "TMX\n(constant\nintensity)",
                    "Technology\noffset\n(1.3%/year)",
                    "Net upstream\nemissions",
                ],
                values: vec![0.0, 8.4, 4.9, -5.2, 0.0],
                colors: vec![
                    palette::LIGHT_GRAY,
                    palette::LIGHT_CORAL,
                    palette::SALMON,
                    palette::LIGHT_GREEN,
                    palette::INDIAN_RED,
                ],
                y_range: (-2.0, 16.0),
                decimals: 1,
                callouts: Vec::new(),
                note: Some(("Actual:\nLine 3: 4.7 Mt\nTMX: 3.4 Mt", (3.5, 1.2), palette::LIGHT_YELLOW)),
            },
        }
    }
}

/// Running totals: `cum[0] = 0`, intermediate bars accumulate, the last bar
/// repeats the previous total.
pub fn cumulative(values: &[f64]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(values.len());
    if values.is_empty() {
        return cum;
    }
    cum.push(0.0);
    for i in 1..values.len() {
        let prev = cum[i - 1];
        if i < values.len() - 1 {
            cum.push(prev + values[i]);
        } else {
            cum.push(prev);
        }
    }
    cum
}

/// Geometry of one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub bottom: f64,
    pub top: f64,
    /// Label text and its y position; the baseline bar has none.
    pub label: Option<(String, f64)>,
    pub is_total: bool,
}

pub fn bars(values: &[f64], decimals: usize) -> Vec<Bar> {
    let cum = cumulative(values);
    let last = values.len().saturating_sub(1);

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i == 0 {
                Bar {
                    index: i,
                    bottom: 0.0,
                    top: 0.0,
                    label: None,
                    is_total: false,
                }
            } else if i == last {
                Bar {
                    index: i,
                    bottom: 0.0,
                    top: cum[i],
                    label: Some((format!("{:.*}", decimals, cum[i]), cum[i] / 2.0)),
                    is_total: true,
                }
            } else {
                let (bottom, top) = if v > 0.0 {
                    (cum[i - 1], cum[i])
                } else {
                    (cum[i], cum[i] + v.abs())
                };
                // Rises are labelled mid-bar, drops half a bar below the new total.
                let (text, label_y) = if v > 0.0 {
                    (format!("+{:.*}", decimals, v), (bottom + top) / 2.0)
                } else {
                    (format!("{:.*}", decimals, v), cum[i] - v.abs() / 2.0)
                };
                Bar {
                    index: i,
                    bottom,
                    top,
                    label: Some((text, label_y)),
                    is_total: false,
                }
            }
        })
        .collect()
}

/// Dashed connector `(x0, x1, y)` from each bar's right edge to the next bar,
/// at that bar's running total. None leads into the total bar.
pub fn connectors(values: &[f64]) -> Vec<(f64, f64, f64)> {
    let cum = cumulative(values);
    let n = values.len();
    (0..n.saturating_sub(2))
        .map(|i| (i as f64 + 0.3, i as f64 + 0.7, cum[i]))
        .collect()
}

/// Wings of an open arrowhead at `tip`, pointing away from `tail`.
///
/// Pixel coordinates; each wing is `len` long and 25 degrees off the shaft.
pub fn arrowhead(tip: (i32, i32), tail: (i32, i32), len: f64) -> [[(i32, i32); 2]; 2] {
    let shaft = ((tip.1 - tail.1) as f64).atan2((tip.0 - tail.0) as f64);
    let spread = 25f64.to_radians();
    let wing = |angle: f64| {
        (
            tip.0 - (len * angle.cos()).round() as i32,
            tip.1 - (len * angle.sin()).round() as i32,
        )
    };
    [[wing(shaft + spread), tip], [wing(shaft - spread), tip]]
}

/// Render one scenario (oil and emissions side by side) to `out_dir`.
pub fn render_waterfall(scenario: &WaterfallScenario, out_dir: &Path, dpi: u32) -> Result<PathBuf, AppError> {
    let path = out_dir.join(scenario.kind.file_name());
    draw_scenario(scenario, &path, dpi).map_err(|e| render_error(&path, e))?;
    tracing::info!(path = %path.display(), "saved waterfall");
    Ok(path)
}

fn draw_scenario(scenario: &WaterfallScenario, path: &Path, dpi: u32) -> Result<(), Box<dyn Error>> {
    let root = canvas(path, figure_size(FIGURE_INCHES.0, FIGURE_INCHES.1, dpi))?;
    let panels = root.split_evenly((1, 2));
    draw_chart(&panels[0], &scenario.oil, dpi)?;
    draw_chart(&panels[1], &scenario.emissions, dpi)?;
    root.present()?;
    Ok(())
}

fn draw_chart(area: &DrawingArea<BitMapBackend<'_>, Shift>, chart_def: &WaterfallChart, dpi: u32) -> Result<(), Box<dyn Error>> {
    let values = &chart_def.values;
    let n = values.len();
    let (y0, y1) = chart_def.y_range;
    let font = |size: f64| ("sans-serif", pt(size, dpi)).into_font().style(FontStyle::Bold);

    let mut chart = ChartBuilder::on(area)
        .caption(chart_def.title, font(14.0))
        .margin(pt(12.0, dpi) as u32)
        .x_label_area_size(pt(52.0, dpi) as u32)
        .y_label_area_size(pt(48.0, dpi) as u32)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .x_label_formatter(&|_| String::new())
        .y_desc(chart_def.y_label)
        .axis_desc_style(font(13.0))
        .label_style(("sans-serif", pt(10.0, dpi)))
        .light_line_style(TRANSPARENT)
        .bold_line_style(BLACK.mix(0.15))
        .draw()?;

    // Zero line.
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(-0.5, 0.0), (n as f64 - 0.5, 0.0)],
        BLACK.stroke_width(2),
    )))?;

    let half = BAR_WIDTH / 2.0;
    let edge = BLACK.stroke_width(pt(1.5, dpi).round() as u32);
    for bar in bars(values, chart_def.decimals) {
        let x = bar.index as f64;
        let corners = [(x - half, bar.bottom), (x + half, bar.top)];
        chart.draw_series(std::iter::once(Rectangle::new(
            corners,
            chart_def.colors[bar.index].filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(corners, edge)))?;

        if let Some((text, y)) = &bar.label {
            let (color, size) = if bar.is_total { (WHITE, 13.0) } else { (BLACK, 12.0) };
            let style = font(size)
                .color(&color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(std::iter::once(Text::new(text.clone(), (x, *y), style)))?;
        }
    }

    for (x0, x1, y) in connectors(values) {
        chart.draw_series(
            dash_segments((x0, y), (x1, y), 0.04, 0.03)
                .into_iter()
                .map(|seg| PathElement::new(seg.to_vec(), BLACK.mix(0.5))),
        )?;
    }

    let line_h = (y1 - y0) * 0.045;
    let text_lines = |text: &'static str, x: f64, bottom: f64| {
        let n = text.lines().count();
        text.lines()
            .enumerate()
            .map(move |(k, line)| (line, (x, bottom + (n - 1 - k) as f64 * line_h)))
            .collect::<Vec<_>>()
    };

    // Arrowheads and category labels are placed in panel pixels.
    let (bx, by) = area.get_base_pixel();
    let to_panel = |(px, py): (i32, i32)| (px - bx, py - by);

    for callout in &chart_def.callouts {
        let stroke = callout.color.stroke_width(pt(1.5, dpi).round() as u32);
        chart.draw_series(std::iter::once(PathElement::new(
            vec![callout.text_at, callout.point_at],
            stroke,
        )))?;
        let tip = to_panel(chart.backend_coord(&callout.point_at));
        let tail = to_panel(chart.backend_coord(&callout.text_at));
        for wing in arrowhead(tip, tail, pt(8.0, dpi)) {
            area.draw(&PathElement::new(wing.to_vec(), stroke))?;
        }
        let style = font(9.0).color(&callout.color).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(
            text_lines(callout.text, callout.text_at.0, callout.text_at.1)
                .into_iter()
                .map(|(line, at)| Text::new(line, at, style.clone())),
        )?;
    }

    if let Some((text, (x, dy), fill)) = chart_def.note {
        // Sits just above the running total before the offset bar.
        let bottom = cumulative(values).get(3).copied().unwrap_or(0.0) + dy;
        let n = text.lines().count() as f64;
        let corners = [(x - 0.45, bottom - 0.4 * line_h), (x + 0.45, bottom + (n + 0.2) * line_h)];
        chart.draw_series(std::iter::once(Rectangle::new(corners, fill.mix(0.75).filled())))?;
        chart.draw_series(std::iter::once(Rectangle::new(corners, BLACK.stroke_width(1))))?;

        let style = font(9.0).color(&BLACK).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(
            text_lines(text, x, bottom)
                .into_iter()
                .map(|(line, at)| Text::new(line, at, style.clone())),
        )?;
    }

    // Category labels go under the axis, outside the plotting area.
    let style = font(10.0).color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));
    let line_px = pt(12.0, dpi) as i32;
    for (i, category) in chart_def.categories.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(i as f64, y0));
        for (k, line) in category.lines().enumerate() {
            let at = (px - bx, py - by + line_px / 2 + k as i32 * line_px);
            area.draw(&Text::new(line, at, style.clone()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_repeats_the_total() {
        assert_eq!(cumulative(&OIL_VALUES), vec![0.0, 343.0, 544.0, 673.0, 655.0, 655.0]);
        let e = cumulative(&[0.0, 8.4, 4.9, -8.3, 0.0]);
        assert!((e[3] - 5.0).abs() < 1e-9);
        assert_eq!(e[3], e[4]);
        assert!(cumulative(&[]).is_empty());
    }

    #[test]
    fn negative_bars_hang_from_the_new_total() {
        let b = bars(&OIL_VALUES, 0);
        assert_eq!((b[1].bottom, b[1].top), (0.0, 343.0));
        assert_eq!((b[3].bottom, b[3].top), (544.0, 673.0));
        assert_eq!((b[4].bottom, b[4].top), (655.0, 673.0));
        assert_eq!(b[4].label, Some(("-18".to_string(), 646.0)));
        assert_eq!(b[1].label.as_ref().map(|l| l.1), Some(171.5));
        assert_eq!(b[1].label.as_ref().map(|l| l.0.as_str()), Some("+343"));
        assert!(b[5].is_total);
        assert_eq!(b[5].label, Some(("655".to_string(), 327.5)));
        assert_eq!(b[0].label, None);
    }

    #[test]
    fn arrowhead_wings_trail_the_tip_symmetrically() {
        // Shaft points straight up (pixel y grows downwards).
        let wings = arrowhead((100, 100), (100, 200), 10.0);
        assert_eq!(wings[0][1], (100, 100));
        assert_eq!(wings[1][1], (100, 100));
        let (left, right) = (wings[0][0], wings[1][0]);
        assert_eq!(left.0 + right.0, 200);
        assert_ne!(left.0, right.0);
        assert_eq!(left.1, right.1);
        assert!(left.1 > 100);

        // Pointing right: wings sit to the left of the tip.
        let wings = arrowhead((50, 50), (0, 50), 10.0);
        assert!(wings.iter().all(|w| w[0].0 < 50));
        assert_eq!(wings[0][0].1 + wings[1][0].1, 100);
    }

    #[test]
    fn emissions_labels_use_one_decimal() {
        let scenario = WaterfallScenario::corrected();
        let b = bars(&scenario.emissions.values, scenario.emissions.decimals);
        let labels: Vec<&str> = b.iter().filter_map(|b| b.label.as_ref().map(|l| l.0.as_str())).collect();
        assert_eq!(labels, vec!["+8.4", "+4.9", "-5.2", "8.1"]);
    }

    #[test]
    fn connectors_stop_before_the_total() {
        let c = connectors(&[0.0, 8.4, 4.9, -8.3, 0.0]);
        assert_eq!(c.len(), 3);
        assert_eq!(c[0], (0.3, 0.7, 0.0));
        assert_eq!(c[1].2, 8.4);
    }

    #[test]
    fn scenarios_differ_only_where_intended() {
        let d = WaterfallScenario::detailed();
        let c = WaterfallScenario::corrected();
        assert_eq!(d.oil.values, c.oil.values);
        assert_eq!(d.emissions.values[3], -8.3);
        assert_eq!(c.emissions.values[3], -5.2);
        assert_eq!(d.oil.y_range, (-50.0, 750.0));
        assert_eq!(c.emissions.y_range, (-2.0, 16.0));
        assert_eq!(d.emissions.categories.len(), 5);
        assert_ne!(d.kind.file_name(), c.kind.file_name());
    }
}
