//! Wind turbine twin: sustained high-temperature and low-RPM tracking with
//! rolling hourly aggregates over retained telemetry.

use crate::telemetry::DeviceTelemetry;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use twinwatch_core::{
    AggregateConfig, DigitalTwin, EpisodeState, History, Incident, MessageProcessor,
    ProcessingContext, ProcessingResult, RetentionPolicy, ThresholdSpec, ThresholdTracker, TwinId,
};

/// Engine temperature ceiling, Celsius
pub const MAX_ALLOWED_TEMPERATURE: f64 = 100.0;
/// Rotor speed floor, RPM
pub const MIN_ALLOWED_RPM: f64 = 60.0;

/// Turbine hardware model, keyed into the maintenance schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurbineModel {
    ModelA,
    ModelB,
    ModelC,
}

impl TurbineModel {
    /// Every model a maintenance schedule must cover
    pub const ALL: [TurbineModel; 3] = [Self::ModelA, Self::ModelB, Self::ModelC];
}

impl fmt::Display for TurbineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelA => write!(f, "ModelA"),
            Self::ModelB => write!(f, "ModelB"),
            Self::ModelC => write!(f, "ModelC"),
        }
    }
}

/// Incident classification for turbine alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurbineIncidentKind {
    HighTemperature,
    LowRpm,
}

impl fmt::Display for TurbineIncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighTemperature => write!(f, "high temperature"),
            Self::LowRpm => write!(f, "low RPM"),
        }
    }
}

/// Configuration error surfaced at startup validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no pre-maintenance window configured for turbine model {0}")]
    MissingMaintenanceWindow(TurbineModel),
}

/// Immutable model-to-pre-maintenance-window map.
///
/// Validated total over all declared models at construction, so lookups
/// cannot fail mid-batch and no synchronization is ever needed.
#[derive(Debug, Clone)]
pub struct MaintenanceWindows {
    windows: [Duration; TurbineModel::ALL.len()],
}

impl MaintenanceWindows {
    /// Build a schedule, failing fast on any model without an entry
    pub fn new(entries: &HashMap<TurbineModel, Duration>) -> Result<Self, ConfigError> {
        let mut windows = [Duration::zero(); TurbineModel::ALL.len()];
        for model in TurbineModel::ALL {
            match entries.get(&model) {
                Some(window) => windows[model as usize] = *window,
                None => return Err(ConfigError::MissingMaintenanceWindow(model)),
            }
        }
        Ok(Self { windows })
    }

    pub fn window_for(&self, model: TurbineModel) -> Duration {
        self.windows[model as usize]
    }
}

impl Default for MaintenanceWindows {
    fn default() -> Self {
        Self {
            windows: [
                Duration::days(90),  // ModelA
                Duration::days(120), // ModelB
                Duration::days(150), // ModelC
            ],
        }
    }
}

/// Per-turbine state owned by the host and mutated only during processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindTurbineTwin {
    pub id: TwinId,
    pub model: TurbineModel,
    /// US state where the turbine is sited
    pub region: String,
    pub next_maintenance: DateTime<Utc>,

    /// Last reading seen, for the reporting surface
    pub last_rpm: f64,
    pub last_temperature: f64,
    pub last_reported: Option<DateTime<Utc>>,

    /// Hysteresis state, one per tracked metric
    pub high_temperature: EpisodeState,
    pub low_rpm: EpisodeState,

    /// Append-only incident trail shared by both metrics
    pub incidents: Vec<Incident<TurbineIncidentKind>>,

    /// Retained telemetry, timestamp-ordered and capacity-bounded
    pub history: History<DeviceTelemetry>,

    /// Report-only aggregates, fully recomputed each invocation
    pub avg_messages_per_hour: f64,
    pub avg_rpm_per_hour: f64,
    pub avg_temperature_per_hour: f64,
}

impl DigitalTwin for WindTurbineTwin {
    fn model_name() -> &'static str {
        "windturbine"
    }

    fn init(id: TwinId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            model: TurbineModel::ModelA,
            region: String::new(),
            next_maintenance: created_at + Duration::days(30),
            last_rpm: 0.0,
            last_temperature: 0.0,
            last_reported: None,
            high_temperature: EpisodeState::default(),
            low_rpm: EpisodeState::default(),
            incidents: Vec::new(),
            history: History::new(),
            avg_messages_per_hour: 0.0,
            avg_rpm_per_hour: 0.0,
            avg_temperature_per_hour: 0.0,
        }
    }

    fn id(&self) -> &TwinId {
        &self.id
    }
}

/// Message processor for the wind turbine model
pub struct WindTurbineProcessor {
    maintenance: MaintenanceWindows,
    temperature: ThresholdTracker<TurbineIncidentKind>,
    rpm: ThresholdTracker<TurbineIncidentKind>,
    retention: RetentionPolicy,
    aggregates: AggregateConfig,
}

impl WindTurbineProcessor {
    pub fn new(maintenance: MaintenanceWindows) -> Self {
        Self {
            maintenance,
            temperature: ThresholdTracker {
                kind: TurbineIncidentKind::HighTemperature,
                spec: ThresholdSpec::above(MAX_ALLOWED_TEMPERATURE),
                sustained_for: Duration::seconds(20),
                sustained_for_pre_maint: Duration::seconds(10),
                min_alert_interval: Duration::seconds(30),
            },
            rpm: ThresholdTracker {
                kind: TurbineIncidentKind::LowRpm,
                spec: ThresholdSpec::below(MIN_ALLOWED_RPM),
                sustained_for: Duration::seconds(20),
                sustained_for_pre_maint: Duration::seconds(10),
                min_alert_interval: Duration::seconds(30),
            },
            retention: RetentionPolicy::default(),
            aggregates: AggregateConfig::default(),
        }
    }
}

impl Default for WindTurbineProcessor {
    fn default() -> Self {
        Self::new(MaintenanceWindows::default())
    }
}

impl MessageProcessor for WindTurbineProcessor {
    type Twin = WindTurbineTwin;
    type Message = DeviceTelemetry;

    /// Always reports `DoUpdate`: the aggregate fields are recomputed on
    /// every invocation, so the state object is rewritten even when no
    /// tracker fired.
    fn process_messages(
        &self,
        ctx: &mut dyn ProcessingContext,
        twin: &mut WindTurbineTwin,
        messages: &[DeviceTelemetry],
        now: DateTime<Utc>,
    ) -> Result<ProcessingResult> {
        let trim_after = self.retention.at_capacity(twin.history.len());

        // An overdue maintenance date keeps the twin in the tightened window.
        let window = self.maintenance.window_for(twin.model);
        let in_pre_maintenance = twin.next_maintenance - now < window;

        for msg in messages {
            twin.last_rpm = msg.rpm;
            twin.last_temperature = msg.temperature;
            twin.last_reported = Some(msg.timestamp);

            self.temperature.track(
                ctx,
                &mut twin.high_temperature,
                &mut twin.incidents,
                msg.temperature,
                now,
                in_pre_maintenance,
            )?;
            self.rpm.track(
                ctx,
                &mut twin.low_rpm,
                &mut twin.incidents,
                msg.rpm,
                now,
                in_pre_maintenance,
            )?;

            twin.history.insert_ordered(msg.clone(), |m| m.timestamp);
        }

        let stats = self.aggregates.averages(
            twin.history.as_slice(),
            now,
            |m| m.timestamp,
            |m| m.rpm,
            |m| m.temperature,
        );
        twin.avg_messages_per_hour = stats.messages;
        twin.avg_rpm_per_hour = stats.primary;
        twin.avg_temperature_per_hour = stats.secondary;

        if trim_after {
            let dropped = self.retention.trim_count();
            twin.history.drop_oldest(dropped);
            tracing::debug!(twin = %twin.id, dropped, "history trimmed");
        }

        Ok(ProcessingResult::DoUpdate)
    }
}
