//! Deterministic demo telemetry generation
//!
//! The generator owns a seeded RNG, so fleet attribute assignment and message
//! streams reproduce exactly across runs.

use crate::telemetry::{DeviceStatus, DeviceTelemetry};
use crate::turbine::{TurbineModel, MAX_ALLOWED_TEMPERATURE, MIN_ALLOWED_RPM};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of a generated message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryProfile {
    /// Any values, in or out of norm
    Random,
    /// Both metrics inside their thresholds
    Normal,
    /// Temperature past its ceiling, RPM in norm
    HighTemperature,
    /// RPM under its floor, temperature in norm
    LowRpm,
}

pub struct TelemetryGenerator {
    rng: StdRng,
}

impl TelemetryGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one message with a timestamp inside the trailing `within`
    /// window ending at `now`.
    pub fn device_message(
        &mut self,
        profile: TelemetryProfile,
        within: Duration,
        now: DateTime<Utc>,
    ) -> DeviceTelemetry {
        let (rpm, temperature) = match profile {
            TelemetryProfile::Random => (
                self.rng.gen_range(45.0..120.0),
                self.rng.gen_range(70.0..120.0),
            ),
            TelemetryProfile::Normal => (
                self.rng.gen_range(MIN_ALLOWED_RPM + 1.0..120.0),
                self.rng.gen_range(70.0..MAX_ALLOWED_TEMPERATURE),
            ),
            TelemetryProfile::HighTemperature => (
                self.rng.gen_range(MIN_ALLOWED_RPM + 1.0..120.0),
                self.rng.gen_range(MAX_ALLOWED_TEMPERATURE + 1.0..120.0),
            ),
            TelemetryProfile::LowRpm => (
                self.rng.gen_range(45.0..MIN_ALLOWED_RPM - 1.0),
                self.rng.gen_range(70.0..MAX_ALLOWED_TEMPERATURE),
            ),
        };

        DeviceTelemetry {
            // Seattle; a single-device feed keeps a fixed site
            latitude: 47.6,
            longitude: -122.34,
            status: DeviceStatus::Running,
            rpm,
            temperature,
            additional_payload: None,
            timestamp: self.timestamp_within(within, now),
        }
    }

    /// Pick a timestamp uniformly inside `[now - within, now]`
    fn timestamp_within(&mut self, within: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
        let span_ms = within.num_milliseconds().max(0);
        let offset = if span_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..=span_ms)
        };
        now - Duration::milliseconds(offset)
    }

    /// Deterministic fleet attribute assignment
    pub fn turbine_model(&mut self) -> TurbineModel {
        TurbineModel::ALL[self.rng.gen_range(0..TurbineModel::ALL.len())]
    }

    pub fn region(&mut self) -> &'static str {
        const REGIONS: [&str; 4] = ["WA", "OR", "CA", "TX"];
        REGIONS[self.rng.gen_range(0..REGIONS.len())]
    }
}
