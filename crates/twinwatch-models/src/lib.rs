//! Twin models for the twinwatch processing engine
//!
//! Two reference models exercise the engine:
//! - Wind turbine: sustained high-temperature and low-RPM tracking with
//!   rolling hourly aggregates over retained telemetry
//! - Gas sensor: latched PPM spike detection with a shutoff command

pub mod gas;
pub mod sim;
pub mod telemetry;
pub mod turbine;

pub use gas::{ActionCommand, GasSensorProcessor, GasSensorTwin};
pub use telemetry::{DeviceStatus, DeviceTelemetry, GasReading};
pub use turbine::{
    ConfigError, MaintenanceWindows, TurbineIncidentKind, TurbineModel, WindTurbineProcessor,
    WindTurbineTwin,
};
