//! Monthly WCS-WTI price differentials, 2018-2024 ($/bbl).
//!
//! Hand-entered from monthly benchmark averages. The table is Alberta-specific
//! by convention (WCS is priced at Hardisty) but carries no province tag.

use crate::domain::PriceObservation;

/// `(year, [Jan..Dec])`.
const WCS_WTI_DIFFERENTIALS: [(i32, [f64; 12]); 7] = [
    (2018, [21.17, 24.51, 27.20, 25.78, 16.73, 15.77, 18.15, 19.51, 29.86, 29.60, 45.93, 43.55]),
    (2019, [17.08, 9.62, 9.94, 10.61, 8.39, 12.92, 12.65, 11.71, 12.11, 12.00, 14.71, 20.77]),
    (2020, [20.70, 23.26, 16.37, 13.05, 16.89, 4.34, 8.21, 7.74, 11.20, 8.23, 9.37, 9.70]),
    (2021, [11.96, 13.91, 11.39, 11.21, 10.39, 12.92, 14.03, 13.26, 13.63, 12.18, 13.90, 18.61]),
    (2022, [17.62, 12.54, 13.93, 12.72, 12.95, 13.67, 21.18, 23.22, 20.08, 21.17, 26.93, 29.30]),
    (2023, [28.18, 25.67, 20.29, 15.97, 15.34, 13.83, 11.95, 11.26, 15.58, 18.41, 21.08, 26.42]),
    (2024, [20.38, 19.42, 20.00, 16.70, 14.43, 12.94, 14.31, 15.31, 14.34, 14.13, 12.39, 12.36]),
];

/// Expand the literal table into one observation per month, in calendar order.
pub fn price_observations() -> Vec<PriceObservation> {
    WCS_WTI_DIFFERENTIALS
        .iter()
        .flat_map(|(year, months)| {
            months
                .iter()
                .enumerate()
                .map(move |(i, &diff)| PriceObservation {
                    year: *year,
                    month: i as u32 + 1,
                    wcs_wti_differential: diff,
                })
        })
        .collect()
}
