//! Incident records and outbound alert payloads

use crate::twin::TwinId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of an incident entry within one tracking episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentPhase {
    /// First violating reading of an episode
    Started,
    /// An alert for the episode went out to the data source
    AlertSent,
    /// The episode closed on an in-bounds reading
    Resolved,
}

/// One immutable entry in a twin's incident trail.
///
/// Entries are append-only and insertion-ordered. All metrics of a twin share
/// one trail while each metric runs its own episode state, so one metric's
/// phases never interleave within another metric's episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident<K> {
    pub kind: K,
    pub phase: IncidentPhase,
    pub timestamp: DateTime<Utc>,
    /// The metric reading that produced this entry
    pub metric_value: f64,
}

/// Outbound alert payload, serialized and handed to the data source.
///
/// Ephemeral: built when a tracker fires and never stored on the twin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert<K> {
    pub incident_type: K,
    pub digital_twin_id: TwinId,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: i64,
    pub in_pre_maintenance_period: bool,
    /// Violating readings seen so far in the episode
    pub prior_warning_count: u32,
}
