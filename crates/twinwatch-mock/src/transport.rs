//! Data-source delivery seam
//!
//! The processing core hands payloads off fire-and-forget; delivering them
//! back to a data source is the host's side of the contract. The memory
//! transport collects deliveries for assertions.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Host-side delivery of outbound payloads back to a data source
#[async_trait]
pub trait DataSourceTransport: Send + Sync {
    async fn deliver(&self, model: &str, instance: &str, payload: Vec<u8>) -> Result<()>;
}

/// In-memory transport with one inbox per (model, instance)
#[derive(Default)]
pub struct MemoryTransport {
    inboxes: DashMap<(String, String), Vec<Vec<u8>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything delivered for one instance
    pub fn received(&self, model: &str, instance: &str) -> Vec<Vec<u8>> {
        self.inboxes
            .remove(&(model.to_string(), instance.to_string()))
            .map(|(_, payloads)| payloads)
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSourceTransport for MemoryTransport {
    async fn deliver(&self, model: &str, instance: &str, payload: Vec<u8>) -> Result<()> {
        self.inboxes
            .entry((model.to_string(), instance.to_string()))
            .or_default()
            .push(payload);
        Ok(())
    }
}
