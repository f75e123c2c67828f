//! Time and category scales
//!
//! The time scale maps calendar dates linearly (by day) onto the horizontal
//! pixel range and saturates outside its domain. The band scale gives each
//! distinct project name a fixed-height row band in row order.

use chrono::{Datelike, Months, NaiveDate};
use protimeline_core::ProjectRow;
use std::collections::HashMap;

/// Height of one project band in pixels
pub const ROW_BAND: f64 = 35.0;

/// Months of padding before the earliest assign date
const LEAD_MONTHS: u32 = 5;
/// Months of padding after the latest end date
const TRAIL_MONTHS: u32 = 2;
/// Fallback window for an empty timeline, in months before "now"
const EMPTY_WINDOW: (u32, u32) = (40, 14);

/// Date → x-pixel mapping, clamped to its domain
#[derive(Clone, Debug, PartialEq)]
pub struct TimeScale {
    start: NaiveDate,
    end: NaiveDate,
    width: f64,
}

impl TimeScale {
    pub fn new(start: NaiveDate, end: NaiveDate, width: f64) -> Self {
        Self { start, end, width }
    }

    pub fn domain(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// X position of `date`
    pub fn at(&self, date: NaiveDate) -> f64 {
        let span = (self.end - self.start).num_days();
        if span <= 0 {
            return 0.0;
        }
        let t = (date - self.start).num_days() as f64 / span as f64;
        t.clamp(0.0, 1.0) * self.width
    }

    /// Calendar-aligned tick dates, roughly `count` of them
    pub fn ticks(&self, count: usize) -> Vec<NaiveDate> {
        let span = (self.end - self.start).num_days();
        if count == 0 || span < 0 {
            return Vec::new();
        }

        let interval = TickInterval::CANDIDATES
            .iter()
            .copied()
            .find(|i| span as f64 / i.approx_days() <= count as f64)
            .unwrap_or(TickInterval::Months(120));

        let mut ticks = Vec::new();
        let mut current = Some(interval.first_on_or_after(self.start));
        while let Some(date) = current {
            if date > self.end {
                break;
            }
            ticks.push(date);
            current = interval.next(date);
        }
        ticks
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TickInterval {
    Days(u32),
    Months(u32),
}

impl TickInterval {
    const CANDIDATES: [TickInterval; 10] = [
        TickInterval::Days(1),
        TickInterval::Days(2),
        TickInterval::Days(7),
        TickInterval::Days(14),
        TickInterval::Months(1),
        TickInterval::Months(3),
        TickInterval::Months(6),
        TickInterval::Months(12),
        TickInterval::Months(24),
        TickInterval::Months(60),
    ];

    fn approx_days(self) -> f64 {
        match self {
            TickInterval::Days(n) => n as f64,
            TickInterval::Months(n) => n as f64 * 30.44,
        }
    }

    fn first_on_or_after(self, date: NaiveDate) -> NaiveDate {
        match self {
            TickInterval::Days(_) => date,
            TickInterval::Months(n) => {
                let mut month_start = date.with_day(1).unwrap_or(date);
                if month_start < date {
                    month_start = month_start + Months::new(1);
                }
                while month_index(month_start) % n != 0 {
                    month_start = month_start + Months::new(1);
                }
                month_start
            }
        }
    }

    fn next(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            TickInterval::Days(n) => date.checked_add_days(chrono::Days::new(u64::from(n))),
            TickInterval::Months(n) => date.checked_add_months(Months::new(n)),
        }
    }
}

fn month_index(date: NaiveDate) -> u32 {
    (date.year().rem_euclid(10_000) as u32) * 12 + date.month0()
}

/// Project name → y-pixel band mapping
#[derive(Clone, Debug, PartialEq)]
pub struct BandScale {
    names: Vec<String>,
    /// Band position of each name in `names`
    index: HashMap<String, usize>,
    step: f64,
}

impl BandScale {
    /// Bands for the distinct names of `names`, in first-seen order
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>, step: f64) -> Self {
        let mut distinct: Vec<String> = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            if !index.contains_key(name) {
                index.insert(name.to_string(), distinct.len());
                distinct.push(name.to_string());
            }
        }
        Self {
            names: distinct,
            index,
            step,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn bandwidth(&self) -> f64 {
        self.step
    }

    /// Bottom of the last band
    pub fn range_end(&self) -> f64 {
        self.names.len() as f64 * self.step
    }

    /// Top of the band for `name`
    pub fn at(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| i as f64 * self.step)
    }
}

/// The two scales every layout computation works from
#[derive(Clone, Debug, PartialEq)]
pub struct ScalePair {
    pub time: TimeScale,
    pub band: BandScale,
}

impl ScalePair {
    /// Derive scales for `rows` laid out over `width` pixels, with the time
    /// domain fitted to the data
    pub fn derive(rows: &[ProjectRow], width: f64, now: NaiveDate) -> Self {
        Self::derive_in(rows, width, now, None)
    }

    /// Like [`ScalePair::derive`], but a `fixed` domain replaces the fitted one
    pub fn derive_in(
        rows: &[ProjectRow],
        width: f64,
        now: NaiveDate,
        fixed: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        let (start, end) = fixed.unwrap_or_else(|| time_domain(rows, now));
        Self {
            time: TimeScale::new(start, end, width.max(0.0)),
            band: BandScale::new(rows.iter().map(|r| r.project_name.as_str()), ROW_BAND),
        }
    }

    pub fn x(&self, date: NaiveDate) -> f64 {
        self.time.at(date)
    }

    /// Band top for `name`; names outside the domain sit at the range start
    pub fn y(&self, name: &str) -> f64 {
        self.band.at(name).unwrap_or(0.0)
    }
}

fn time_domain(rows: &[ProjectRow], now: NaiveDate) -> (NaiveDate, NaiveDate) {
    let earliest = rows.iter().map(|r| r.pm_assign_date).min();
    let latest = rows.iter().map(|r| r.end_date).max();

    match (earliest, latest) {
        (Some(earliest), Some(latest)) => (
            earliest
                .checked_sub_months(Months::new(LEAD_MONTHS))
                .unwrap_or(earliest),
            latest
                .checked_add_months(Months::new(TRAIL_MONTHS))
                .unwrap_or(latest),
        ),
        _ => (
            now.checked_sub_months(Months::new(EMPTY_WINDOW.0))
                .unwrap_or(now),
            now.checked_sub_months(Months::new(EMPTY_WINDOW.1))
                .unwrap_or(now),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protimeline_core::RowId;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn row(name: &str, start: NaiveDate, end: NaiveDate) -> ProjectRow {
        ProjectRow::new(RowId::new(name), name, start, end)
    }

    #[test]
    fn domain_pads_months() {
        let rows = vec![
            row("Altera", date(2015, 6, 1), date(2018, 11, 30)),
            row("eASIC", date(2018, 2, 2), date(2020, 3, 15)),
        ];
        let scales = ScalePair::derive(&rows, 800.0, date(2020, 3, 15));
        assert_eq!(scales.time.domain(), (date(2015, 1, 1), date(2020, 5, 15)));
    }

    #[test]
    fn empty_rows_use_default_window() {
        let now = date(2020, 3, 15);
        let scales = ScalePair::derive(&[], 800.0, now);
        assert_eq!(scales.time.domain(), (date(2016, 11, 15), date(2019, 1, 15)));

        let x = scales.x(now);
        assert!(x.is_finite());
        assert_eq!(x, 800.0);
        assert_eq!(scales.band.range_end(), 0.0);
    }

    #[test]
    fn time_scale_is_linear_and_clamped() {
        let scale = TimeScale::new(date(2020, 1, 1), date(2020, 1, 11), 100.0);
        assert_eq!(scale.at(date(2020, 1, 1)), 0.0);
        assert_eq!(scale.at(date(2020, 1, 6)), 50.0);
        assert_eq!(scale.at(date(2020, 1, 11)), 100.0);
        assert_eq!(scale.at(date(2019, 6, 1)), 0.0);
        assert_eq!(scale.at(date(2021, 6, 1)), 100.0);
    }

    #[test]
    fn time_scale_is_monotonic() {
        let scale = TimeScale::new(date(2015, 1, 1), date(2020, 5, 15), 777.0);
        let mut previous = f64::MIN;
        let mut day = date(2014, 12, 1);
        while day < date(2020, 7, 1) {
            let x = scale.at(day);
            assert!(x >= previous, "{day} mapped to {x} after {previous}");
            previous = x;
            day = day + chrono::Days::new(9);
        }
    }

    #[test]
    fn fixed_domain_overrides_fitted_padding() {
        let rows = vec![
            row("Altera", date(2015, 6, 1), date(2018, 11, 30)),
            row("eASIC", date(2018, 2, 2), date(2020, 3, 15)),
        ];
        let window = (date(2017, 1, 1), date(2019, 1, 1));
        let scales = ScalePair::derive_in(&rows, 730.0, date(2020, 3, 15), Some(window));

        assert_eq!(scales.time.domain(), window);
        assert_eq!(scales.x(date(2017, 1, 1)), 0.0);
        assert_eq!(scales.x(date(2015, 6, 1)), 0.0);
        assert_eq!(scales.x(date(2020, 3, 15)), 730.0);
        assert_eq!(scales.y("eASIC"), 35.0);

        let fitted = ScalePair::derive_in(&rows, 730.0, date(2020, 3, 15), None);
        assert_eq!(fitted, ScalePair::derive(&rows, 730.0, date(2020, 3, 15)));
    }

    #[test]
    fn degenerate_domain_maps_to_origin() {
        let scale = TimeScale::new(date(2020, 1, 1), date(2020, 1, 1), 100.0);
        assert_eq!(scale.at(date(2020, 1, 1)), 0.0);
    }

    #[test]
    fn band_scale_assigns_fixed_bands() {
        let band = BandScale::new(["Altera", "MAVinci GmbH", "eASIC"], ROW_BAND);
        assert_eq!(band.at("Altera"), Some(0.0));
        assert_eq!(band.at("MAVinci GmbH"), Some(35.0));
        assert_eq!(band.at("eASIC"), Some(70.0));
        assert_eq!(band.at("Unknown"), None);
        assert_eq!(band.range_end(), 105.0);
    }

    #[test]
    fn band_scale_shares_bands_for_duplicate_names() {
        let band = BandScale::new(["A", "B", "A"], ROW_BAND);
        assert_eq!(band.names().len(), 2);
        assert_eq!(band.at("A"), Some(0.0));
        assert_eq!(band.range_end(), 70.0);
    }

    #[test]
    fn band_scale_indexes_many_names() {
        let names: Vec<String> = (0..2000).map(|i| format!("project-{}", i % 1500)).collect();
        let band = BandScale::new(names.iter().map(String::as_str), ROW_BAND);
        assert_eq!(band.names().len(), 1500);
        assert_eq!(band.at("project-0"), Some(0.0));
        assert_eq!(band.at("project-1499"), Some(1499.0 * ROW_BAND));
        assert_eq!(band.at("project-1500"), None);
        assert_eq!(band.names()[42], "project-42");
    }

    #[test]
    fn ticks_are_month_aligned_for_long_spans() {
        let scale = TimeScale::new(date(2015, 1, 1), date(2020, 5, 15), 800.0);
        let ticks = scale.ticks(10);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 11);
        assert!(ticks.iter().all(|t| t.day() == 1 && t.month0() % 6 == 0));
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ticks_use_days_for_short_spans() {
        let scale = TimeScale::new(date(2020, 1, 1), date(2020, 1, 8), 100.0);
        let ticks = scale.ticks(10);
        assert_eq!(ticks.first(), Some(&date(2020, 1, 1)));
        assert_eq!(ticks.last(), Some(&date(2020, 1, 8)));
        assert_eq!(ticks.len(), 8);
    }

    #[test]
    fn zero_ticks_requested() {
        let scale = TimeScale::new(date(2020, 1, 1), date(2020, 1, 8), 100.0);
        assert!(scale.ticks(0).is_empty());
    }
}
