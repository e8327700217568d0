//! Threshold hysteresis tracking
//!
//! One generic component covers every sustained-violation tracker in the
//! system: [`ThresholdTracker`] keeps a full incident trail with throttled
//! alerting, while [`SpikeTracker`] latches an episode open and escalates
//! without bookkeeping. Both share the violation predicate and episode state,
//! so a model instantiates them with a polarity, limits, and durations
//! instead of re-implementing the state machine per metric.

use crate::context::{LogSeverity, ProcessingContext};
use crate::incident::{Alert, Incident, IncidentPhase};
use crate::twin::ProcessingResult;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the limit counts as a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Values above the limit violate (e.g. temperature)
    High,
    /// Values below the limit violate (e.g. RPM)
    Low,
}

/// A limit with polarity.
///
/// Comparisons are strict: a value exactly at the limit is in bounds.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdSpec {
    pub polarity: Polarity,
    pub limit: f64,
}

impl ThresholdSpec {
    /// Violate on values above `limit`
    pub fn above(limit: f64) -> Self {
        Self {
            polarity: Polarity::High,
            limit,
        }
    }

    /// Violate on values below `limit`
    pub fn below(limit: f64) -> Self {
        Self {
            polarity: Polarity::Low,
            limit,
        }
    }

    pub fn violates(&self, value: f64) -> bool {
        match self.polarity {
            Polarity::High => value > self.limit,
            Polarity::Low => value < self.limit,
        }
    }
}

/// Hysteresis state for one metric's current episode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeState {
    /// Set while a violation run is open
    pub started_at: Option<DateTime<Utc>>,
    /// Violating readings seen in the current run
    pub violations: u32,
}

impl EpisodeState {
    pub fn is_tracking(&self) -> bool {
        self.started_at.is_some()
    }
}

/// What one reading did to a [`ThresholdTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStep {
    /// In-bounds reading with no episode open
    Unchanged,
    /// Reading opened or extended an episode
    Violating { alert_sent: bool },
    /// Reading closed an open episode
    Resolved,
}

impl TrackStep {
    /// The persistence outcome this step implies for the tracker alone
    pub fn result(self) -> ProcessingResult {
        match self {
            Self::Unchanged => ProcessingResult::NoUpdate,
            Self::Violating { .. } | Self::Resolved => ProcessingResult::DoUpdate,
        }
    }
}

/// Sustained-violation tracker with an incident trail and throttled alerts.
///
/// The state machine has two states per metric. An in-bounds reading in
/// Normal does nothing. The first violating reading opens an episode and
/// appends a `Started` incident. While the episode is open, each violating
/// reading bumps the warning counter; once the episode has run longer than
/// `sustained_for` (or the tighter `sustained_for_pre_maint` inside a
/// pre-maintenance period) the reading becomes an alert candidate, subject to
/// throttling. The first in-bounds reading closes the episode with a
/// `Resolved` incident and resets the counter.
pub struct ThresholdTracker<K> {
    pub kind: K,
    pub spec: ThresholdSpec,
    /// How long a violation may persist before alerting
    pub sustained_for: Duration,
    /// Tighter allowance applied inside a pre-maintenance period
    pub sustained_for_pre_maint: Duration,
    /// Minimum spacing between alerts after the first one of an episode
    pub min_alert_interval: Duration,
}

impl<K> ThresholdTracker<K>
where
    K: Copy + fmt::Display + Serialize,
{
    /// Feed one reading through the state machine.
    ///
    /// Appends incidents to the twin's shared trail and sends alerts through
    /// `ctx` when due. Total over its inputs: out-of-range values are
    /// ordinary readings, not errors.
    pub fn track(
        &self,
        ctx: &mut dyn ProcessingContext,
        episode: &mut EpisodeState,
        incidents: &mut Vec<Incident<K>>,
        value: f64,
        now: DateTime<Utc>,
        in_pre_maintenance: bool,
    ) -> Result<TrackStep> {
        if self.spec.violates(value) {
            episode.violations += 1;

            let started_at = match episode.started_at {
                Some(t) => t,
                None => {
                    episode.started_at = Some(now);
                    incidents.push(Incident {
                        kind: self.kind,
                        phase: IncidentPhase::Started,
                        timestamp: now,
                        metric_value: value,
                    });
                    tracing::debug!(kind = %self.kind, value, "violation episode started");
                    now
                }
            };

            let elapsed = now - started_at;
            let over_allowance = elapsed > self.sustained_for
                || (in_pre_maintenance && elapsed > self.sustained_for_pre_maint);

            let mut alert_sent = false;
            if over_allowance && self.alert_permitted(episode, incidents, now) {
                self.send_alert(ctx, value, now, elapsed, in_pre_maintenance, episode.violations)?;
                incidents.push(Incident {
                    kind: self.kind,
                    phase: IncidentPhase::AlertSent,
                    timestamp: now,
                    metric_value: value,
                });
                alert_sent = true;
            }

            Ok(TrackStep::Violating { alert_sent })
        } else if episode.is_tracking() {
            incidents.push(Incident {
                kind: self.kind,
                phase: IncidentPhase::Resolved,
                timestamp: now,
                metric_value: value,
            });
            let line = format!(
                "Instance {} exited {} state, resuming normal operation",
                ctx.twin_id(),
                self.kind
            );
            ctx.log_message(LogSeverity::Info, &line);
            tracing::info!(kind = %self.kind, value, "violation resolved");
            *episode = EpisodeState::default();
            Ok(TrackStep::Resolved)
        } else {
            Ok(TrackStep::Unchanged)
        }
    }

    /// Alert throttling tie-break.
    ///
    /// Permitted when the most recent incident of any kind still carries the
    /// episode's start timestamp (no alert has gone out this episode), or
    /// when more than `min_alert_interval` has passed since the most recent
    /// incident. Guarantees at least one alert per qualifying episode while
    /// damping storms from back-to-back violating readings.
    fn alert_permitted(
        &self,
        episode: &EpisodeState,
        incidents: &[Incident<K>],
        now: DateTime<Utc>,
    ) -> bool {
        match incidents.last() {
            Some(last) => {
                episode.started_at == Some(last.timestamp)
                    || now - last.timestamp > self.min_alert_interval
            }
            None => true,
        }
    }

    fn send_alert(
        &self,
        ctx: &mut dyn ProcessingContext,
        value: f64,
        now: DateTime<Utc>,
        elapsed: Duration,
        in_pre_maintenance: bool,
        warnings: u32,
    ) -> Result<()> {
        let alert = Alert {
            incident_type: self.kind,
            digital_twin_id: ctx.twin_id().clone(),
            timestamp: now,
            duration_secs: elapsed.num_seconds(),
            in_pre_maintenance_period: in_pre_maintenance,
            prior_warning_count: warnings,
        };
        let payload = serde_json::to_vec(&alert)?;
        let line = format!(
            "Instance {} reported {} condition, premaint: {}, prior warning count: {}",
            alert.digital_twin_id, self.kind, in_pre_maintenance, warnings
        );
        ctx.send_to_data_source(payload);
        ctx.log_message(LogSeverity::Info, &line);
        tracing::info!(
            kind = %self.kind,
            value,
            duration_secs = alert.duration_secs,
            "alert sent"
        );
        Ok(())
    }
}

/// What one reading did to a [`SpikeTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeStep {
    /// Reading within bounds; the tracker never re-arms an open episode
    InBounds,
    /// First crossing opened an episode
    EpisodeStarted,
    /// Violating reading inside an episode, below escalation
    Violating,
    /// Reading escalated the episode
    Escalated,
}

/// Latched spike tracker.
///
/// The first crossing of the limit opens an episode without escalating, even
/// when the reading already sits past the hard limit. From the second
/// violating reading onward, a reading escalates when the episode has run
/// longer than `sustained_for` or the reading reaches `hard_limit` (the one
/// inclusive comparison in the system). The episode never resolves and every
/// qualifying reading escalates again; the caller owns the one-shot action
/// payload and any latch.
///
/// Durations are measured on reading timestamps, not the processing clock.
#[derive(Debug, Clone, Copy)]
pub struct SpikeTracker {
    pub spec: ThresholdSpec,
    /// Readings at or past this value escalate regardless of duration
    pub hard_limit: f64,
    /// Episode duration past which any violating reading escalates
    pub sustained_for: Duration,
}

impl SpikeTracker {
    pub fn observe(&self, episode: &mut EpisodeState, value: f64, at: DateTime<Utc>) -> SpikeStep {
        if !self.spec.violates(value) {
            return SpikeStep::InBounds;
        }
        match episode.started_at {
            None => {
                episode.started_at = Some(at);
                episode.violations = 1;
                tracing::debug!(value, "spike episode started");
                SpikeStep::EpisodeStarted
            }
            Some(started) => {
                episode.violations += 1;
                if at - started > self.sustained_for || value >= self.hard_limit {
                    SpikeStep::Escalated
                } else {
                    SpikeStep::Violating
                }
            }
        }
    }
}
