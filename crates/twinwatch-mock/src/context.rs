//! Processing-context implementations for tests and the mock host

use twinwatch_core::{LogSeverity, ProcessingContext, TwinId};

/// Context double that records every side effect.
///
/// The mock environment uses one per invocation and forwards the captured
/// payloads to its transport afterwards; tests use it directly to unit-test a
/// processor without any environment.
pub struct RecordingContext {
    id: TwinId,
    /// Payloads handed to `send_to_data_source`, in order
    pub sent: Vec<Vec<u8>>,
    /// Log lines with their severities, in order
    pub logged: Vec<(LogSeverity, String)>,
}

impl RecordingContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TwinId::new(id),
            sent: Vec::new(),
            logged: Vec::new(),
        }
    }

    /// Take the captured payloads, leaving the context reusable
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl ProcessingContext for RecordingContext {
    fn twin_id(&self) -> &TwinId {
        &self.id
    }

    fn send_to_data_source(&mut self, payload: Vec<u8>) {
        self.sent.push(payload);
    }

    fn log_message(&mut self, severity: LogSeverity, message: &str) {
        tracing::debug!(twin = %self.id, ?severity, line = message, "twin log");
        self.logged.push((severity, message.to_string()));
    }
}
