//! Panel construction.
//!
//! The panel stacks Alberta (treated) on top of Saskatchewan (control) and
//! attaches the treatment, time and instrument columns every estimator reads.
//! Rows are not deduplicated or re-sorted: `time_trend` is the row's position
//! within its province in load order, which assumes the loaders emit months
//! chronologically (they do, because the source files are chronological).

use std::collections::HashMap;

use crate::domain::{
    AlbertaRow, AnalysisConfig, MonthlyObservation, PanelRow, PriceObservation, Province, RailObservation,
    YearMonth,
};

/// Stack provincial series (Alberta first) and derive indicator columns.
pub fn build_panel(
    alberta: &[MonthlyObservation],
    saskatchewan: &[MonthlyObservation],
    config: &AnalysisConfig,
) -> Vec<PanelRow> {
    let mut counters: HashMap<Province, usize> = HashMap::new();

    alberta
        .iter()
        .chain(saskatchewan.iter())
        .map(|obs| {
            let counter = counters.entry(obs.province).or_insert(0);
            let time_trend = *counter;
            *counter += 1;
            panel_row(obs, time_trend, config)
        })
        .collect()
}

fn panel_row(obs: &MonthlyObservation, time_trend: usize, config: &AnalysisConfig) -> PanelRow {
    let period = obs.period();
    let treated = u8::from(obs.province.is_treated());
    let line3_post = u8::from(period.is_on_or_after(config.line3.in_service));
    let tmx_post = u8::from(period.is_on_or_after(config.tmx.in_service));

    PanelRow {
        province: obs.province,
        year: obs.year,
        month: obs.month,
        production_kbpd: obs.production_kbpd,
        treated,
        line3_post,
        tmx_post,
        line3_did: treated * line3_post,
        tmx_did: treated * tmx_post,
        time_trend,
        pipeline_capacity_instrument: capacity_instrument(period, config),
    }
}

/// Cumulative capacity (kb/d) of pipelines in service at `period`.
///
/// A step function of the calendar only, so it is identical for both provinces.
pub fn capacity_instrument(period: YearMonth, config: &AnalysisConfig) -> f64 {
    [&config.line3, &config.tmx]
        .iter()
        .filter(|event| period.is_on_or_after(event.in_service))
        .map(|event| event.capacity_kbpd)
        .sum()
}

/// Alberta rows left-joined with the price and rail tables on `(year, month)`.
///
/// Months with no price or rail observation keep their production data and
/// carry `None` in the missing column.
pub fn extend_alberta(
    panel: &[PanelRow],
    prices: &[PriceObservation],
    rail: &[RailObservation],
) -> Vec<AlbertaRow> {
    let mut price_by_month: HashMap<(i32, u32), f64> = HashMap::new();
    for p in prices {
        price_by_month
            .entry((p.year, p.month))
            .or_insert(p.wcs_wti_differential);
    }
    let mut rail_by_month: HashMap<(i32, u32), f64> = HashMap::new();
    for r in rail {
        rail_by_month.entry((r.year, r.month)).or_insert(r.rail_kbpd);
    }

    panel
        .iter()
        .filter(|row| row.province == Province::Alberta)
        .map(|row| AlbertaRow {
            panel: row.clone(),
            wcs_wti_differential: price_by_month.get(&(row.year, row.month)).copied(),
            rail_kbpd: rail_by_month.get(&(row.year, row.month)).copied(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(province: Province, year: i32, month: u32, kbpd: f64) -> MonthlyObservation {
        MonthlyObservation {
            province,
            year,
            month,
            production_kbpd: kbpd,
        }
    }

    fn fixture() -> Vec<PanelRow> {
        let alberta = vec![
            obs(Province::Alberta, 2021, 9, 3000.0),
            obs(Province::Alberta, 2021, 10, 3100.0),
            obs(Province::Alberta, 2024, 4, 3500.0),
            obs(Province::Alberta, 2024, 5, 3600.0),
        ];
        let sask = vec![
            obs(Province::Saskatchewan, 2021, 9, 450.0),
            obs(Province::Saskatchewan, 2021, 10, 455.0),
        ];
        build_panel(&alberta, &sask, &AnalysisConfig::default())
    }

    #[test]
    fn treatment_flags_switch_on_at_in_service_month() {
        let panel = fixture();
        let ab: Vec<&PanelRow> = panel.iter().filter(|r| r.treated == 1).collect();

        assert_eq!((ab[0].line3_post, ab[0].tmx_post), (0, 0));
        assert_eq!((ab[1].line3_post, ab[1].tmx_post), (1, 0));
        assert_eq!((ab[2].line3_post, ab[2].tmx_post), (1, 0));
        assert_eq!((ab[3].line3_post, ab[3].tmx_post), (1, 1));
        assert_eq!(ab[3].line3_did, 1);
        assert_eq!(ab[3].tmx_did, 1);
    }

    #[test]
    fn control_rows_never_carry_interactions() {
        let panel = fixture();
        for row in panel.iter().filter(|r| r.province == Province::Saskatchewan) {
            assert_eq!(row.treated, 0);
            assert_eq!(row.line3_did, 0);
            assert_eq!(row.tmx_did, 0);
        }
        let oct = panel
            .iter()
            .find(|r| r.province == Province::Saskatchewan && r.month == 10)
            .unwrap();
        assert_eq!(oct.line3_post, 1);
    }

    #[test]
    fn time_trend_counts_within_province_in_load_order() {
        let panel = fixture();
        let trends: Vec<(Province, usize)> = panel.iter().map(|r| (r.province, r.time_trend)).collect();
        assert_eq!(
            trends,
            vec![
                (Province::Alberta, 0),
                (Province::Alberta, 1),
                (Province::Alberta, 2),
                (Province::Alberta, 3),
                (Province::Saskatchewan, 0),
                (Province::Saskatchewan, 1),
            ]
        );
    }

    #[test]
    fn capacity_steps_with_each_pipeline() {
        let config = AnalysisConfig::default();
        let at = |y, m| capacity_instrument(YearMonth::new(y, m).unwrap(), &config);
        assert_eq!(at(2021, 9), 0.0);
        assert_eq!(at(2021, 10), 590.0);
        assert_eq!(at(2024, 4), 590.0);
        assert_eq!(at(2024, 5), 1180.0);

        let panel = fixture();
        let sask_oct = panel.iter().find(|r| r.treated == 0 && r.month == 10).unwrap();
        let ab_oct = panel
            .iter()
            .find(|r| r.treated == 1 && r.year == 2021 && r.month == 10)
            .unwrap();
        assert_eq!(sask_oct.pipeline_capacity_instrument, ab_oct.pipeline_capacity_instrument);
    }

    #[test]
    fn flags_are_monotone_within_province() {
        let panel = fixture();
        for province in Province::ALL {
            let rows: Vec<&PanelRow> = panel.iter().filter(|r| r.province == province).collect();
            for w in rows.windows(2) {
                assert!(w[0].line3_post <= w[1].line3_post);
                assert!(w[0].tmx_post <= w[1].tmx_post);
            }
        }
    }

    #[test]
    fn alberta_extension_left_joins() {
        let panel = fixture();
        let prices = vec![PriceObservation {
            year: 2021,
            month: 9,
            wcs_wti_differential: 13.63,
        }];
        let rail = vec![RailObservation {
            year: 2021,
            month: 10,
            rail_kbpd: 150.0,
        }];
        let ext = extend_alberta(&panel, &prices, &rail);

        assert_eq!(ext.len(), 4);
        assert_eq!(ext[0].wcs_wti_differential, Some(13.63));
        assert_eq!(ext[0].rail_kbpd, None);
        assert_eq!(ext[1].wcs_wti_differential, None);
        assert_eq!(ext[1].rail_kbpd, Some(150.0));
        assert!(ext.iter().all(|r| r.panel.province == Province::Alberta));
    }
}
