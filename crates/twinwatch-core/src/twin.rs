//! Twin identity and the outcome reported back to the host
//!
//! Twins are the stateful entities being monitored. The hosting runtime owns
//! their lifecycle; this module defines what the engine needs to address one
//! and to tell the host whether its state changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a twin instance, assigned by the data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TwinId(pub String);

impl TwinId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TwinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TwinId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A twin model the host can instantiate on first contact
pub trait DigitalTwin: Send + 'static {
    /// Model name used for routing (e.g. `"windturbine"`)
    fn model_name() -> &'static str
    where
        Self: Sized;

    /// Initial state for a new instance
    fn init(id: TwinId, created_at: DateTime<Utc>) -> Self
    where
        Self: Sized;

    /// The instance identifier
    fn id(&self) -> &TwinId;
}

/// Outcome of one processing invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingResult {
    /// State was mutated; the host should persist it
    DoUpdate,
    /// State unchanged; persistence can be skipped
    NoUpdate,
}

impl ProcessingResult {
    /// Combine two outcomes; any mutation wins
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self == Self::DoUpdate || other == Self::DoUpdate {
            Self::DoUpdate
        } else {
            Self::NoUpdate
        }
    }
}
