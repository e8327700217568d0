//! Telemetry value objects, as decoded by the host before dispatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status reported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceStatus {
    #[default]
    Running,
    Idle,
    Stopped,
}

/// One wind-turbine telemetry message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetry {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub status: DeviceStatus,
    /// Rotor speed
    pub rpm: f64,
    /// Engine temperature, Celsius
    pub temperature: f64,
    /// Padding used by load tests to fatten messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_payload: Option<Vec<u8>>,
    /// When the device originated the message
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for DeviceTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - lat:{}, long:{}, rpm: {}, temp: {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.latitude,
            self.longitude,
            self.rpm,
            self.temperature
        )
    }
}

/// One gas-sensor reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasReading {
    /// Gas concentration, parts per million
    pub ppm: f64,
    pub timestamp: DateTime<Utc>,
}
