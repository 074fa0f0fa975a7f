//! Formatted terminal output.
//!
//! Every function returns a `String`; the caller decides where it goes.
//! Estimation code never prints.

use std::fmt::Write;

use crate::domain::AnalysisConfig;
use crate::emissions::EmissionsSummary;
use crate::estimate::{
    DescriptiveDid, EventComparison, RegressionDid, TwoStageResult, significance_stars,
};
use crate::io::{LoadSummary, SkipReason};
use crate::math::Coefficient;

const RULE_WIDTH: usize = 80;

pub fn format_banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}\n")
}

/// Row counts by source, plus skip counts when anything was dropped.
pub fn format_loaded(source: &str, summary: &LoadSummary) -> String {
    let mut out = format!("{source}: {} months\n", summary.rows_kept);
    let counts = summary.skip_counts();
    if !counts.is_empty() {
        let parts: Vec<String> = counts
            .iter()
            .map(|(reason, n)| format!("{} {n}", skip_label(*reason)))
            .collect();
        let _ = writeln!(out, "  skipped: {}", parts.join(", "));
    }
    out
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::MissingLabel => "missing label",
        SkipReason::BadLabel => "bad label",
        SkipReason::OutOfRange => "out of range",
        SkipReason::NoData => "no data",
        SkipReason::BadNumber => "bad number",
        SkipReason::UnknownMonth => "unknown month",
        SkipReason::NoYear => "no year",
    }
}

fn format_event(out: &mut String, c: &EventComparison) {
    let _ = writeln!(out, "\n{} Effect:", c.event);
    let _ = writeln!(
        out,
        "  Alberta:      {:.0} -> {:.0} kb/d (change {:+.0})",
        c.treated_before, c.treated_after, c.treated_change
    );
    let _ = writeln!(
        out,
        "  Saskatchewan: {:.0} -> {:.0} kb/d (change {:+.0})",
        c.control_before, c.control_after, c.control_change
    );
    let _ = writeln!(out, "  DiD estimate: {:+.0} kb/d", c.did);
}

fn coef_line(label: &str, c: &Coefficient, decimals: usize, unit: &str) -> String {
    format!(
        "{label}{:>+7.*} {unit} (p={:.4}) {}",
        decimals,
        c.estimate,
        c.p_value,
        significance_stars(c.p_value)
    )
    .trim_end()
    .to_string()
}

pub fn format_did(descriptive: &DescriptiveDid, regression: &RegressionDid) -> String {
    let mut out = format_banner("PART 1: DIFFERENCE-IN-DIFFERENCES (Saskatchewan control)");

    out.push_str("\nDescriptive DiD\n");
    format_event(&mut out, &descriptive.line3);
    let gap = descriptive.line3.did.abs();
    let direction = if descriptive.line3.did >= 0.0 { "more" } else { "less" };
    let _ = writeln!(out, "  (Alberta grew {gap:.0} kb/d {direction} than Saskatchewan)");
    format_event(&mut out, &descriptive.tmx);

    out.push_str("\nRegression DiD (HC1, linear trend)\n\n");
    let _ = writeln!(out, "{}", coef_line("Line 3 DiD:  ", &regression.line3, 1, "kb/d"));
    let _ = writeln!(out, "{}", coef_line("TMX DiD:     ", &regression.tmx, 1, "kb/d"));
    let _ = writeln!(out, "R^2:         {:.3}", regression.fit.r_squared);
    let _ = writeln!(out, "n:           {}", regression.fit.n_obs);
    out
}

pub fn format_two_stage(result: &TwoStageResult, config: &AnalysisConfig) -> String {
    let mut out = format_banner("PART 2: TWO-STAGE LEAST SQUARES (WCS-WTI endogeneity)");

    let first = &result.first;
    out.push_str("\nFirst stage: pipeline capacity -> WCS-WTI differential\n\n");
    let _ = writeln!(
        out,
        "Pipeline capacity: {:+.4} $/bbl per {:.0} kb/d capacity",
        first.capacity.estimate, config.capacity_unit_kbpd
    );
    let _ = writeln!(out, "                   (p={:.4})", first.capacity.p_value);
    let _ = writeln!(out, "F-statistic: {:.2}", first.f_value);
    if first.strong {
        let _ = writeln!(out, "Strong instrument (F > {:.0})", config.weak_instrument_f);
    } else {
        let _ = writeln!(
            out,
            "WARNING: weak instrument (F <= {:.0}), results may be unreliable",
            config.weak_instrument_f
        );
    }

    let second = &result.second;
    out.push_str("\nSecond stage: predicted WCS-WTI -> production\n\n");
    let _ = writeln!(
        out,
        "Predicted WCS-WTI: {:>+7.2} kb/d per $/bbl (p={:.4})",
        second.price.estimate, second.price.p_value
    );
    let _ = writeln!(out, "{}", coef_line("Line 3 (direct):   ", &second.line3_direct, 1, "kb/d"));
    let _ = writeln!(out, "{}", coef_line("TMX (direct):      ", &second.tmx_direct, 1, "kb/d"));
    let _ = writeln!(out, "R^2:               {:.3}", second.fit.r_squared);
    if !second.fit.is_full_rank() {
        let _ = writeln!(
            out,
            "note: second-stage regressors are collinear (rank {} of {}); minimum-norm estimates shown",
            second.fit.rank,
            second.fit.coefficients.len()
        );
    }

    out.push_str("\nTotal effects through the price channel\n");
    for e in &result.effects {
        let _ = writeln!(
            out,
            "{:<7} {:.0} kb/d capacity -> {:.2} $/bbl change -> {:.0} kb/d production",
            format!("{}:", e.pipeline),
            e.capacity_kbpd,
            e.differential_change,
            e.production_kbpd
        );
    }
    out
}

pub fn format_emissions(e: &EmissionsSummary, config: &AnalysisConfig) -> String {
    let mut out = format_banner(&format!(
        "PART 3: EMISSIONS WITH DECLINING INTENSITY ({:.1}%/year)",
        config.decline_rate * 100.0
    ));

    out.push_str("\nEmissions intensity:\n");
    for p in &e.intensity {
        let _ = writeln!(out, "  {}: {:.1} kg CO2e/bbl", p.year, p.kg_per_bbl);
    }

    out.push_str("\nEmissions changes (declining intensity)\n");
    let _ = writeln!(out, "Line 3: {:+.1} Mt CO2e/year", e.line3_change);
    let _ = writeln!(out, "TMX:    {:+.1} Mt CO2e/year", e.tmx_change);
    let _ = writeln!(out, "Total:  {:+.1} Mt CO2e/year", e.total_change);

    let _ = writeln!(
        out,
        "\nWith constant intensity ({:.0} kg/bbl): {:+.1} Mt/year",
        config.constant_intensity, e.constant_total
    );
    let _ = writeln!(out, "With declining intensity:            {:+.1} Mt/year", e.total_change);
    let _ = writeln!(out, "Difference: {:.1} Mt/year", e.declining_minus_constant);
    out
}

/// Closing summary of the headline numbers.
pub fn format_summary(descriptive: &DescriptiveDid, two_stage: &TwoStageResult, e: &EmissionsSummary) -> String {
    let mut out = format_banner("SUMMARY");
    let _ = writeln!(out, "\n1. Difference-in-differences (Saskatchewan control)");
    let _ = writeln!(out, "   Line 3 effect: {:+.0} kb/d", descriptive.line3.did);
    let _ = writeln!(out, "   TMX effect:    {:+.0} kb/d", descriptive.tmx.did);
    let _ = writeln!(out, "\n2. Two-stage least squares");
    let _ = writeln!(
        out,
        "   Price channel: {:.1} kb/d per $/bbl",
        two_stage.second.price.estimate
    );
    let _ = writeln!(out, "\n3. Declining emissions intensity");
    let _ = writeln!(out, "   Total emissions: {:.1} Mt/year", e.total_change);
    let _ = writeln!(
        out,
        "   {:.1} Mt/year {} than the constant-intensity assumption",
        e.declining_minus_constant.abs(),
        if e.declining_minus_constant <= 0.0 { "lower" } else { "higher" }
    );
    out
}
