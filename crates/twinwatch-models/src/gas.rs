//! Gas sensor twin: latched PPM spike detection with a shutoff command.

use crate::telemetry::GasReading;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use twinwatch_core::{
    DigitalTwin, EpisodeState, LogSeverity, MessageProcessor, ProcessingContext, ProcessingResult,
    SpikeStep, SpikeTracker, ThresholdSpec, TwinId,
};

/// Sustained-concentration ceiling, PPM
pub const MAX_ALLOWED_PPM: f64 = 50.0;
/// How long a high-PPM episode may run before escalation
pub const MAX_ALLOWED_MINUTES: i64 = 15;
/// Readings at or past this level escalate immediately
pub const SPIKE_ALERT_PPM: f64 = 200.0;

/// Command sent back to the device on escalation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCommand {
    pub description: String,
    pub code: u32,
}

impl ActionCommand {
    /// The shutoff command issued when air quality escalates
    pub fn shutoff() -> Self {
        Self {
            description: "Shutdown the incoming gas pipe".to_string(),
            code: 100,
        }
    }
}

/// Per-sensor state owned by the host and mutated only during processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasSensorTwin {
    pub id: TwinId,

    /// Last reading seen, for the reporting surface
    pub last_ppm: f64,
    pub last_reported: Option<DateTime<Utc>>,

    /// Current high-PPM episode; never cleared once opened
    pub episode: EpisodeState,
    /// Latched once any reading escalates
    pub alarm_sounded: bool,
    /// High-PPM episodes opened over the twin's lifetime
    pub episodes_started: u32,
}

impl DigitalTwin for GasSensorTwin {
    fn model_name() -> &'static str {
        "gassensor"
    }

    fn init(id: TwinId, _created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            last_ppm: 0.0,
            last_reported: None,
            episode: EpisodeState::default(),
            alarm_sounded: false,
            episodes_started: 0,
        }
    }

    fn id(&self) -> &TwinId {
        &self.id
    }
}

/// Message processor for the gas sensor model
pub struct GasSensorProcessor {
    spike: SpikeTracker,
}

impl Default for GasSensorProcessor {
    fn default() -> Self {
        Self {
            spike: SpikeTracker {
                spec: ThresholdSpec::above(MAX_ALLOWED_PPM),
                hard_limit: SPIKE_ALERT_PPM,
                sustained_for: Duration::minutes(MAX_ALLOWED_MINUTES),
            },
        }
    }
}

impl MessageProcessor for GasSensorProcessor {
    type Twin = GasSensorTwin;
    type Message = GasReading;

    /// Durations run on reading timestamps, so the invocation clock goes
    /// unused here.
    fn process_messages(
        &self,
        ctx: &mut dyn ProcessingContext,
        twin: &mut GasSensorTwin,
        messages: &[GasReading],
        _now: DateTime<Utc>,
    ) -> Result<ProcessingResult> {
        for msg in messages {
            twin.last_ppm = msg.ppm;
            twin.last_reported = Some(msg.timestamp);

            match self.spike.observe(&mut twin.episode, msg.ppm, msg.timestamp) {
                SpikeStep::EpisodeStarted => twin.episodes_started += 1,
                SpikeStep::Escalated => {
                    twin.alarm_sounded = true;
                    let payload = serde_json::to_vec(&ActionCommand::shutoff())?;
                    ctx.send_to_data_source(payload);
                    let line = format!(
                        "Instance {} escalated high PPM, shutoff commanded at {} ppm",
                        twin.id, msg.ppm
                    );
                    ctx.log_message(LogSeverity::Warn, &line);
                    tracing::warn!(twin = %twin.id, ppm = msg.ppm, "gas shutoff commanded");
                }
                SpikeStep::InBounds | SpikeStep::Violating => {}
            }
        }

        Ok(ProcessingResult::DoUpdate)
    }
}
