//! Aggregation semantics over synthetic histories

use chrono::{DateTime, Duration, TimeZone, Utc};
use twinwatch_core::AggregateConfig;

#[derive(Debug, Clone)]
struct Reading {
    value: f64,
    at: DateTime<Utc>,
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn reading(hour: i64, minute: i64, value: f64) -> Reading {
    Reading {
        value,
        at: base() + Duration::hours(hour) + Duration::minutes(minute),
    }
}

fn averages_of(history: &[Reading], now: DateTime<Utc>) -> twinwatch_core::HourlyAverages {
    AggregateConfig::default().averages(history, now, |r| r.at, |r| r.value, |r| r.value * 10.0)
}

#[test]
fn empty_hours_are_excluded_from_the_denominator() {
    // Three messages in hour 1, one in hour 5; the other 22 hours are empty.
    let history = vec![
        reading(1, 0, 10.0),
        reading(1, 20, 20.0),
        reading(1, 40, 30.0),
        reading(5, 30, 50.0),
    ];
    let now = base() + Duration::hours(24);

    let stats = averages_of(&history, now);

    // Mean count over the two occupied hours, not over 24.
    assert_eq!(stats.messages, 2.0);
}

#[test]
fn metric_average_is_mean_of_window_means() {
    let history = vec![
        reading(1, 0, 10.0),
        reading(1, 20, 20.0),
        reading(1, 40, 30.0),
        reading(5, 30, 50.0),
    ];
    let now = base() + Duration::hours(24);

    let stats = averages_of(&history, now);

    // Hour 1 means 20, hour 5 means 50; the sparse hour weighs the same as
    // the dense one. A flat average over all four readings would be 27.5.
    assert_eq!(stats.primary, 35.0);
    assert_eq!(stats.secondary, 350.0);
}

#[test]
fn readings_older_than_the_span_are_ignored() {
    let now = base() + Duration::hours(48);
    // All readings sit in the first day, outside [now - 24h, now).
    let history = vec![reading(1, 0, 10.0), reading(2, 0, 20.0)];

    let stats = averages_of(&history, now);
    assert_eq!(stats.messages, 0.0);
    assert_eq!(stats.primary, 0.0);
}

#[test]
fn single_window_history() {
    let now = base() + Duration::hours(24);
    let history = vec![reading(23, 10, 80.0), reading(23, 50, 120.0)];

    let stats = averages_of(&history, now);
    assert_eq!(stats.messages, 2.0);
    assert_eq!(stats.primary, 100.0);
}
