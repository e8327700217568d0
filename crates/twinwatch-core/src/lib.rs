//! TwinWatch Core Processing Engine
//!
//! This crate provides the per-twin telemetry processing engine with:
//! - Host-facing seams: processing context, message processor, update outcome
//! - Threshold hysteresis tracking with incident trails and throttled alerts
//! - Tumbling-window aggregation over retained message history
//! - Time-ordered, capacity-bounded history maintenance
//!
//! The hosting runtime that creates, loads, and persists twin instances is an
//! external collaborator: it hands a processor one twin's state, one ordered
//! batch of decoded messages, a side-effect context, and the current time,
//! and persists the state again when the processor reports a mutation.

pub mod context;
pub mod history;
pub mod hysteresis;
pub mod incident;
pub mod twin;
pub mod window;

pub use context::{LogSeverity, MessageProcessor, ProcessingContext};
pub use history::{History, RetentionPolicy};
pub use hysteresis::{
    EpisodeState, Polarity, SpikeStep, SpikeTracker, ThresholdSpec, ThresholdTracker, TrackStep,
};
pub use incident::{Alert, Incident, IncidentPhase};
pub use twin::{DigitalTwin, ProcessingResult, TwinId};
pub use window::{AggregateConfig, HourlyAverages};
