//! Tumbling-window aggregation over retained telemetry
//!
//! The rolling report fields on a twin's public state are recomputed in full
//! from its message history on every invocation; nothing is maintained
//! incrementally. Cost is O(history), which the history capacity bound keeps
//! tractable.

use chrono::{DateTime, Duration, Utc};

/// Partition `items` into contiguous fixed-width windows covering
/// `[start, end)`, assigning each item to the window containing its
/// timestamp. Items outside the range are skipped.
pub fn tumbling_windows<'a, T, F>(
    items: &'a [T],
    timestamp: F,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    width: Duration,
) -> Vec<Vec<&'a T>>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut windows: Vec<Vec<&T>> = Vec::new();
    let width_ms = width.num_milliseconds();
    if width_ms <= 0 || end <= start {
        return windows;
    }

    let span_ms = (end - start).num_milliseconds();
    let count = (span_ms + width_ms - 1) / width_ms;
    windows.resize_with(count as usize, Vec::new);

    for item in items {
        let ts = timestamp(item);
        if ts < start || ts >= end {
            continue;
        }
        let idx = ((ts - start).num_milliseconds() / width_ms) as usize;
        windows[idx].push(item);
    }
    windows
}

/// Rolling averages reported on a twin's public state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourlyAverages {
    /// Mean message count across non-empty windows
    pub messages: f64,
    /// Mean of per-window means for the primary metric
    pub primary: f64,
    /// Mean of per-window means for the secondary metric
    pub secondary: f64,
}

/// Trailing-window aggregation settings
#[derive(Debug, Clone, Copy)]
pub struct AggregateConfig {
    /// Trailing span to cover, ending at `now`
    pub span: Duration,
    /// Width of one tumbling window
    pub window: Duration,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            span: Duration::hours(24),
            window: Duration::hours(1),
        }
    }
}

impl AggregateConfig {
    /// Compute per-window averages over the trailing span ending at `now`.
    ///
    /// Windows with no messages are excluded from every denominator, and each
    /// non-empty window contributes its own mean with equal weight: the
    /// result is a mean of per-window means, not a flat average over all
    /// readings. Sparse hours therefore weigh the same as dense ones.
    pub fn averages<T, TS, P, S>(
        &self,
        history: &[T],
        now: DateTime<Utc>,
        timestamp: TS,
        primary: P,
        secondary: S,
    ) -> HourlyAverages
    where
        TS: Fn(&T) -> DateTime<Utc>,
        P: Fn(&T) -> f64,
        S: Fn(&T) -> f64,
    {
        if history.is_empty() {
            return HourlyAverages::default();
        }

        let start = now - self.span;
        let windows = tumbling_windows(history, timestamp, start, now, self.window);
        let occupied: Vec<&Vec<&T>> = windows.iter().filter(|w| !w.is_empty()).collect();
        if occupied.is_empty() {
            return HourlyAverages::default();
        }

        let n = occupied.len() as f64;
        let messages = occupied.iter().map(|w| w.len() as f64).sum::<f64>() / n;
        let window_mean = |metric: &dyn Fn(&T) -> f64| -> f64 {
            occupied
                .iter()
                .map(|w| w.iter().map(|&item| metric(item)).sum::<f64>() / w.len() as f64)
                .sum::<f64>()
                / n
        };

        HourlyAverages {
            messages,
            primary: window_mean(&primary),
            secondary: window_mean(&secondary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_items_land_in_their_window() {
        let start = base();
        let end = start + Duration::hours(3);
        let items = vec![
            start + Duration::minutes(5),
            start + Duration::minutes(70),
            start + Duration::minutes(150),
            start + Duration::minutes(170),
        ];

        let windows = tumbling_windows(&items, |t| *t, start, end, Duration::hours(1));
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].len(), 1);
        assert_eq!(windows[1].len(), 1);
        assert_eq!(windows[2].len(), 2);
    }

    #[test]
    fn test_out_of_range_items_are_skipped() {
        let start = base();
        let end = start + Duration::hours(1);
        let items = vec![start - Duration::minutes(1), end, end + Duration::hours(5)];

        let windows = tumbling_windows(&items, |t| *t, start, end, Duration::hours(1));
        assert_eq!(windows.len(), 1);
        assert!(windows[0].is_empty());
    }

    #[test]
    fn test_empty_history_averages_to_zero() {
        let stats = AggregateConfig::default().averages(
            &[] as &[DateTime<Utc>],
            base(),
            |t| *t,
            |_| 1.0,
            |_| 1.0,
        );
        assert_eq!(stats, HourlyAverages::default());
    }
}
