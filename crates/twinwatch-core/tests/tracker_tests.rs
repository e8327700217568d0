//! Scenario tests for the hysteresis trackers

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use twinwatch_core::{
    EpisodeState, Incident, IncidentPhase, LogSeverity, ProcessingContext, SpikeStep,
    SpikeTracker, ThresholdSpec, ThresholdTracker, TrackStep, TwinId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum TestKind {
    Overheat,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overheat")
    }
}

/// Minimal context double capturing side effects
struct TestContext {
    id: TwinId,
    sent: Vec<Vec<u8>>,
    logged: Vec<(LogSeverity, String)>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            id: TwinId::new("twin_1"),
            sent: Vec::new(),
            logged: Vec::new(),
        }
    }
}

impl ProcessingContext for TestContext {
    fn twin_id(&self) -> &TwinId {
        &self.id
    }

    fn send_to_data_source(&mut self, payload: Vec<u8>) {
        self.sent.push(payload);
    }

    fn log_message(&mut self, severity: LogSeverity, message: &str) {
        self.logged.push((severity, message.to_string()));
    }
}

fn overheat_tracker() -> ThresholdTracker<TestKind> {
    ThresholdTracker {
        kind: TestKind::Overheat,
        spec: ThresholdSpec::above(100.0),
        sustained_for: Duration::seconds(20),
        sustained_for_pre_maint: Duration::seconds(10),
        min_alert_interval: Duration::seconds(30),
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn started_count(incidents: &[Incident<TestKind>]) -> usize {
    incidents
        .iter()
        .filter(|i| i.phase == IncidentPhase::Started)
        .count()
}

#[test]
fn one_started_incident_per_contiguous_run() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    for i in 0..5 {
        let step = tracker
            .track(
                &mut ctx,
                &mut episode,
                &mut incidents,
                110.0,
                t0() + Duration::seconds(i),
                false,
            )
            .unwrap();
        assert!(matches!(step, TrackStep::Violating { .. }));
    }

    assert_eq!(started_count(&incidents), 1);
    assert_eq!(episode.violations, 5);
    assert_eq!(episode.started_at, Some(t0()));
}

#[test]
fn alert_waits_for_sustained_violation() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    // Opens the episode; duration zero, nothing sustained yet.
    let step = tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), false)
        .unwrap();
    assert_eq!(step, TrackStep::Violating { alert_sent: false });

    // Still under the 20 s allowance.
    let step = tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            112.0,
            t0() + Duration::seconds(15),
            false,
        )
        .unwrap();
    assert_eq!(step, TrackStep::Violating { alert_sent: false });
    assert!(ctx.sent.is_empty());

    // Past the allowance: first alert of the episode goes out regardless of
    // the spacing rule.
    let step = tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            115.0,
            t0() + Duration::seconds(25),
            false,
        )
        .unwrap();
    assert_eq!(step, TrackStep::Violating { alert_sent: true });
    assert_eq!(ctx.sent.len(), 1);
}

#[test]
fn alerts_are_throttled_after_the_first() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), false)
        .unwrap();
    tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            110.0,
            t0() + Duration::seconds(25),
            false,
        )
        .unwrap();
    assert_eq!(ctx.sent.len(), 1);

    // One second after the alert: suppressed by the 30 s minimum interval.
    tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            110.0,
            t0() + Duration::seconds(26),
            false,
        )
        .unwrap();
    assert_eq!(ctx.sent.len(), 1);

    // 35 s after the last incident: due again.
    let step = tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            110.0,
            t0() + Duration::seconds(61),
            false,
        )
        .unwrap();
    assert_eq!(step, TrackStep::Violating { alert_sent: true });
    assert_eq!(ctx.sent.len(), 2);
}

#[test]
fn pre_maintenance_tightens_the_allowance() {
    let tracker = overheat_tracker();
    let at = t0() + Duration::seconds(15);

    // 15 s of violation: inside the normal 20 s allowance.
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();
    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), false)
        .unwrap();
    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, at, false)
        .unwrap();
    assert!(ctx.sent.is_empty());

    // Same timeline in a pre-maintenance period: past the 10 s allowance.
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();
    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), true)
        .unwrap();
    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, at, true)
        .unwrap();
    assert_eq!(ctx.sent.len(), 1);
}

#[test]
fn resolution_closes_the_episode_once() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), false)
        .unwrap();
    tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            110.0,
            t0() + Duration::seconds(5),
            false,
        )
        .unwrap();

    let step = tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            95.0,
            t0() + Duration::seconds(10),
            false,
        )
        .unwrap();
    assert_eq!(step, TrackStep::Resolved);
    assert!(!episode.is_tracking());
    assert_eq!(episode.violations, 0);

    let resolved: Vec<_> = incidents
        .iter()
        .filter(|i| i.phase == IncidentPhase::Resolved)
        .collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].metric_value, 95.0);

    // Further in-bounds readings leave everything untouched.
    let step = tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            96.0,
            t0() + Duration::seconds(11),
            false,
        )
        .unwrap();
    assert_eq!(step, TrackStep::Unchanged);
    assert_eq!(incidents.len(), 2); // Started + Resolved
}

#[test]
fn boundary_reading_never_violates() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    let step = tracker
        .track(&mut ctx, &mut episode, &mut incidents, 100.0, t0(), false)
        .unwrap();
    assert_eq!(step, TrackStep::Unchanged);
    assert!(incidents.is_empty());

    let step = tracker
        .track(&mut ctx, &mut episode, &mut incidents, 101.0, t0(), false)
        .unwrap();
    assert_eq!(step, TrackStep::Violating { alert_sent: false });
}

#[test]
fn alert_payload_is_camel_case_json() {
    let tracker = overheat_tracker();
    let mut ctx = TestContext::new();
    let mut episode = EpisodeState::default();
    let mut incidents = Vec::new();

    tracker
        .track(&mut ctx, &mut episode, &mut incidents, 110.0, t0(), false)
        .unwrap();
    tracker
        .track(
            &mut ctx,
            &mut episode,
            &mut incidents,
            110.0,
            t0() + Duration::seconds(25),
            false,
        )
        .unwrap();

    let payload: serde_json::Value = serde_json::from_slice(&ctx.sent[0]).unwrap();
    assert_eq!(payload["incidentType"], "Overheat");
    assert_eq!(payload["digitalTwinId"], "twin_1");
    assert_eq!(payload["durationSecs"], 25);
    assert_eq!(payload["inPreMaintenancePeriod"], false);
    assert_eq!(payload["priorWarningCount"], 2);
}

#[test]
fn spike_escalates_on_sustained_episode() {
    let tracker = SpikeTracker {
        spec: ThresholdSpec::above(50.0),
        hard_limit: 200.0,
        sustained_for: Duration::minutes(15),
    };
    let mut episode = EpisodeState::default();

    assert_eq!(tracker.observe(&mut episode, 55.0, t0()), SpikeStep::EpisodeStarted);
    assert_eq!(
        tracker.observe(&mut episode, 90.0, t0() + Duration::minutes(20)),
        SpikeStep::Escalated
    );
}

#[test]
fn spike_short_episode_stays_quiet() {
    let tracker = SpikeTracker {
        spec: ThresholdSpec::above(50.0),
        hard_limit: 200.0,
        sustained_for: Duration::minutes(15),
    };
    let mut episode = EpisodeState::default();

    assert_eq!(tracker.observe(&mut episode, 55.0, t0()), SpikeStep::EpisodeStarted);
    assert_eq!(
        tracker.observe(&mut episode, 90.0, t0() + Duration::minutes(5)),
        SpikeStep::Violating
    );
    assert_eq!(
        tracker.observe(&mut episode, 40.0, t0() + Duration::minutes(6)),
        SpikeStep::InBounds
    );
    // The episode stays open; it never re-arms.
    assert!(episode.is_tracking());
}
