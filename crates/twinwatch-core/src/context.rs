//! Processing seams between the host runtime and twin models
//!
//! The host dispatches one ordered batch of decoded messages to a twin's
//! processor together with a context for side effects. Both outbound
//! operations are fire-and-forget handoffs to the host's delivery subsystem;
//! the processor never awaits or retries them.

use crate::twin::{ProcessingResult, TwinId};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Severity of a host-logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Side-effecting operations the host exposes to one processor invocation
pub trait ProcessingContext {
    /// Identifier of the twin being processed
    fn twin_id(&self) -> &TwinId;

    /// Hand an opaque payload to the host for delivery to the data source.
    ///
    /// Delivery happens asynchronously on the host side; the processor does
    /// not observe whether it completed.
    fn send_to_data_source(&mut self, payload: Vec<u8>);

    /// Write a line to the host's log sink. A no-op when no sink is
    /// configured.
    fn log_message(&mut self, severity: LogSeverity, message: &str);
}

/// Per-model message processing logic.
///
/// The host guarantees at most one invocation per twin identity at a time, so
/// implementations mutate the twin freely without synchronization.
pub trait MessageProcessor {
    type Twin;
    type Message;

    /// Process one ordered batch of messages for one twin instance.
    ///
    /// `now` is sampled once by the host per invocation; every duration and
    /// throttling decision inside the batch uses it.
    fn process_messages(
        &self,
        ctx: &mut dyn ProcessingContext,
        twin: &mut Self::Twin,
        messages: &[Self::Message],
        now: DateTime<Utc>,
    ) -> Result<ProcessingResult>;
}
