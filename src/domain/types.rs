//! Shared domain types.
//!
//! All of these are plain values: created once by the loaders or the panel
//! builder, never mutated afterwards, and serializable so they can be dumped
//! to CSV/JSON unchanged.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar month key used to join every table in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Build a key, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let next = NaiveDate::from_ymd_opt(ny, nm, 1).unwrap_or(NaiveDate::MAX);
        (next - self.first_day()).num_days() as u32
    }

    /// `true` when this month is `start` or later.
    pub fn is_on_or_after(&self, start: YearMonth) -> bool {
        *self >= start
    }

    /// Fractional year, used as the x coordinate of time-series plots.
    pub fn as_decimal_year(&self) -> f64 {
        self.year as f64 + (self.month as f64 - 1.0) / 12.0
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Province {
    Alberta,
    Saskatchewan,
}

impl Province {
    pub const ALL: [Province; 2] = [Province::Alberta, Province::Saskatchewan];

    pub fn display_name(&self) -> &'static str {
        match self {
            Province::Alberta => "Alberta",
            Province::Saskatchewan => "Saskatchewan",
        }
    }

    /// Alberta is the treated province; Saskatchewan is the control.
    pub fn is_treated(&self) -> bool {
        matches!(self, Province::Alberta)
    }
}

/// One month of provincial crude production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub province: Province,
    pub year: i32,
    pub month: u32,
    /// Thousand barrels per day.
    pub production_kbpd: f64,
}

impl MonthlyObservation {
    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// National crude-by-rail exports for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailObservation {
    pub year: i32,
    pub month: u32,
    pub rail_kbpd: f64,
}

/// WCS-WTI differential for one month, $/bbl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub year: i32,
    pub month: u32,
    pub wcs_wti_differential: f64,
}

/// A production observation with treatment/time indicators attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub province: Province,
    pub year: i32,
    pub month: u32,
    pub production_kbpd: f64,
    pub treated: u8,
    pub line3_post: u8,
    pub tmx_post: u8,
    pub line3_did: u8,
    pub tmx_did: u8,
    /// 0-based position of the row within its province, in load order.
    pub time_trend: usize,
    /// Installed capacity of completed pipelines (kb/d) as of this month.
    pub pipeline_capacity_instrument: f64,
}

impl PanelRow {
    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// Comparison windows around the two in-service dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Before Line 3 (`line3_post == 0`).
    Pre,
    /// Line 3 in service, TMX not yet (`line3_post == 1 && tmx_post == 0`).
    PostLine3,
    /// TMX in service (`tmx_post == 1`).
    PostTmx,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Pre, Window::PostLine3, Window::PostTmx];

    pub fn contains(&self, row: &PanelRow) -> bool {
        match self {
            Window::Pre => row.line3_post == 0,
            Window::PostLine3 => row.line3_post == 1 && row.tmx_post == 0,
            Window::PostTmx => row.tmx_post == 1,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Window::Pre => "pre-Line 3",
            Window::PostLine3 => "post-Line 3",
            Window::PostTmx => "post-TMX",
        }
    }
}

/// An Alberta panel row left-joined with prices and rail volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbertaRow {
    pub panel: PanelRow,
    pub wcs_wti_differential: Option<f64>,
    pub rail_kbpd: Option<f64>,
}

/// Emissions intensity (kg CO2e/bbl) for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityPoint {
    pub year: i32,
    pub kg_per_bbl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_february_and_december() {
        assert_eq!(YearMonth::new(2020, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2021, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(2019, 12).unwrap().days_in_month(), 31);
        assert_eq!(YearMonth::new(2019, 9).unwrap().days_in_month(), 30);
    }

    #[test]
    fn ordering_follows_the_calendar() {
        let sep = YearMonth::new(2021, 9).unwrap();
        let oct = YearMonth::new(2021, 10).unwrap();
        assert!(oct.is_on_or_after(oct));
        assert!(!sep.is_on_or_after(oct));
        assert!(YearMonth::new(2022, 1).unwrap().is_on_or_after(oct));
    }

    #[test]
    fn month_thirteen_is_rejected() {
        assert!(YearMonth::new(2020, 13).is_none());
        assert!(YearMonth::new(2020, 0).is_none());
    }
}
