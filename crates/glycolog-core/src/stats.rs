//! Reading statistics for the charts screen.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::reading::{Reading, Severity};

/// Aggregate over a set of readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    /// Readings whose value could not be read. They are part of `count`
    /// but of no value figure.
    pub unreadable: usize,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    /// Share of readable values classified normal, in percent.
    pub in_range_pct: Option<f64>,
    /// Earliest and latest valid timestamps. Readings with an invalid date
    /// count toward the value figures but not here.
    pub first_at: Option<DateTime<Utc>>,
    pub last_at: Option<DateTime<Utc>>,
}

impl Summary {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let mut summary = Summary {
            count: readings.len(),
            ..Summary::default()
        };
        if readings.is_empty() {
            return summary;
        }

        let mut sum = 0.0;
        for r in readings {
            if let Some(at) = r.timestamp.at() {
                summary.first_at = Some(summary.first_at.map_or(at, |f| f.min(at)));
                summary.last_at = Some(summary.last_at.map_or(at, |l| l.max(at)));
            }
            let Some(value) = r.value.mg_dl() else {
                summary.unreadable += 1;
                continue;
            };
            sum += value;
            summary.min = Some(summary.min.map_or(value, |m| m.min(value)));
            summary.max = Some(summary.max.map_or(value, |m| m.max(value)));
            match Severity::classify(value) {
                Severity::Low => summary.low += 1,
                Severity::Normal => summary.normal += 1,
                Severity::High => summary.high += 1,
            }
        }

        let valued = summary.count - summary.unreadable;
        if valued > 0 {
            summary.average = Some(sum / valued as f64);
            summary.in_range_pct = Some(summary.normal as f64 * 100.0 / valued as f64);
        }
        summary
    }
}

/// Mean value for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub day: NaiveDate,
    pub average: f64,
    pub count: usize,
}

/// Per-day (UTC) means, oldest day first. Readings without a valid
/// timestamp or value are skipped.
pub fn daily_averages(readings: &[Reading]) -> Vec<DailyAverage> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for r in readings {
        if let (Some(at), Some(value)) = (r.timestamp.at(), r.value.mg_dl()) {
            let entry = by_day.entry(at.date_naive()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    by_day
        .into_iter()
        .map(|(day, (sum, count))| DailyAverage {
            day,
            average: sum / count as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{ReadingTime, ReadingValue};
    use chrono::TimeZone;

    fn reading(id: &str, value: f64, at: Option<(i32, u32, u32, u32)>) -> Reading {
        Reading {
            id: id.into(),
            value: ReadingValue::Valid { mg_dl: value },
            note: None,
            timestamp: match at {
                Some((y, m, d, h)) => ReadingTime::Valid {
                    at: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
                },
                None => ReadingTime::Invalid { raw: "?".into() },
            },
        }
    }

    #[test]
    fn empty_summary() {
        let s = Summary::from_readings(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.average, None);
        assert_eq!(s.in_range_pct, None);
    }

    #[test]
    fn summary_counts_severities_and_bounds() {
        let readings = vec![
            reading("1", 60.0, Some((2024, 1, 2, 8))),
            reading("2", 100.0, Some((2024, 1, 1, 8))),
            reading("3", 200.0, None),
            reading("4", 140.0, Some((2024, 1, 3, 20))),
        ];
        let s = Summary::from_readings(&readings);
        assert_eq!(s.count, 4);
        assert_eq!(s.unreadable, 0);
        assert_eq!(s.average, Some(125.0));
        assert_eq!(s.min, Some(60.0));
        assert_eq!(s.max, Some(200.0));
        assert_eq!((s.low, s.normal, s.high), (1, 2, 1));
        assert_eq!(s.in_range_pct, Some(50.0));
        assert_eq!(
            s.first_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(
            s.last_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 20, 0, 0).unwrap())
        );
    }

    #[test]
    fn daily_averages_group_by_day_and_skip_invalid_dates() {
        let readings = vec![
            reading("1", 100.0, Some((2024, 1, 2, 8))),
            reading("2", 120.0, Some((2024, 1, 2, 19))),
            reading("3", 90.0, Some((2024, 1, 1, 7))),
            reading("4", 300.0, None),
        ];
        let days = daily_averages(&readings);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[0].average, 90.0);
        assert_eq!(days[1].average, 110.0);
        assert_eq!(days[1].count, 2);
    }

    #[test]
    fn unreadable_values_count_but_skip_value_figures() {
        let mut bad = reading("2", 0.0, Some((2024, 1, 4, 9)));
        bad.value = ReadingValue::Invalid {
            raw: "beaucoup".into(),
        };
        let readings = vec![reading("1", 100.0, Some((2024, 1, 4, 8))), bad];

        let s = Summary::from_readings(&readings);
        assert_eq!(s.count, 2);
        assert_eq!(s.unreadable, 1);
        assert_eq!(s.average, Some(100.0));
        assert_eq!((s.min, s.max), (Some(100.0), Some(100.0)));
        assert_eq!(s.in_range_pct, Some(100.0));
        assert_eq!(
            s.last_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0).unwrap())
        );

        let days = daily_averages(&readings);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 1);

        let all_bad = Summary::from_readings(&readings[1..]);
        assert_eq!(all_bad.average, None);
        assert_eq!(all_bad.in_range_pct, None);
    }
}
