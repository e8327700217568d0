//! Mock host environment: model registry and message routing

use crate::context::RecordingContext;
use crate::transport::{DataSourceTransport, MemoryTransport};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use twinwatch_core::{DigitalTwin, MessageProcessor, ProcessingResult, TwinId};

/// Whether a payload reached a twin instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendingResult {
    Handled,
    NotHandled,
}

/// Side effects gathered from one processor invocation
struct DispatchOutcome {
    result: ProcessingResult,
    outbound: Vec<Vec<u8>>,
}

/// One registered model: its processor plus all live instances
struct Registration<T, P> {
    processor: P,
    /// Per-instance state; the mutex enforces one writer per twin identity
    instances: DashMap<String, Mutex<T>>,
}

trait ModelHandler: Send + Sync {
    fn dispatch(
        &self,
        instance: &str,
        payloads: &[&[u8]],
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome>;

    fn snapshot(&self, instance: &str) -> Option<serde_json::Value>;

    fn instance_count(&self) -> usize;
}

impl<T, P> ModelHandler for Registration<T, P>
where
    T: DigitalTwin + Serialize,
    P: MessageProcessor<Twin = T> + Send + Sync,
    P::Message: DeserializeOwned,
{
    fn dispatch(
        &self,
        instance: &str,
        payloads: &[&[u8]],
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome> {
        let messages = payloads
            .iter()
            .map(|payload| serde_json::from_slice(payload))
            .collect::<Result<Vec<P::Message>, _>>()
            .context("malformed message payload")?;

        let entry = self
            .instances
            .entry(instance.to_string())
            .or_insert_with(|| Mutex::new(T::init(TwinId::new(instance), now)));
        let mut twin = entry
            .lock()
            .map_err(|_| anyhow!("instance lock poisoned: {instance}"))?;

        let mut ctx = RecordingContext::new(instance);
        let result = self
            .processor
            .process_messages(&mut ctx, &mut twin, &messages, now)?;

        Ok(DispatchOutcome {
            result,
            outbound: ctx.take_sent(),
        })
    }

    fn snapshot(&self, instance: &str) -> Option<serde_json::Value> {
        let entry = self.instances.get(instance)?;
        let twin = entry.lock().ok()?;
        serde_json::to_value(&*twin).ok()
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Builder for a [`MockEnvironment`]
#[derive(Default)]
pub struct MockEnvironmentBuilder {
    models: HashMap<String, Box<dyn ModelHandler>>,
    transport: Option<Arc<dyn DataSourceTransport>>,
}

impl MockEnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a twin model with its processor.
    ///
    /// The twin type supplies the model name used for routing.
    pub fn with_model<T, M, P>(mut self, processor: P) -> Self
    where
        T: DigitalTwin + Serialize,
        M: DeserializeOwned + Send,
        P: MessageProcessor<Twin = T, Message = M> + Send + Sync + 'static,
    {
        self.models.insert(
            T::model_name().to_string(),
            Box::new(Registration {
                processor,
                instances: DashMap::new(),
            }),
        );
        self
    }

    /// Replace the default in-memory transport
    pub fn with_transport(mut self, transport: Arc<dyn DataSourceTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> MockEnvironment {
        let (transport, memory) = match self.transport {
            Some(transport) => (transport, None),
            None => {
                let memory = Arc::new(MemoryTransport::new());
                (memory.clone() as Arc<dyn DataSourceTransport>, Some(memory))
            }
        };
        MockEnvironment {
            models: self.models,
            transport,
            memory,
        }
    }
}

/// In-memory stand-in for the hosting runtime
pub struct MockEnvironment {
    models: HashMap<String, Box<dyn ModelHandler>>,
    transport: Arc<dyn DataSourceTransport>,
    memory: Option<Arc<MemoryTransport>>,
}

impl MockEnvironment {
    /// Route one JSON message, creating the instance on first contact
    pub async fn send(&self, model: &str, instance: &str, payload: &[u8]) -> Result<SendingResult> {
        self.send_at(model, instance, payload, Utc::now()).await
    }

    /// Same as [`send`](Self::send) with an explicit processing time
    pub async fn send_at(
        &self,
        model: &str,
        instance: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SendingResult> {
        self.send_batch_at(model, instance, &[payload], now).await
    }

    /// Route one ordered batch through a single processor invocation
    pub async fn send_batch_at(
        &self,
        model: &str,
        instance: &str,
        payloads: &[&[u8]],
        now: DateTime<Utc>,
    ) -> Result<SendingResult> {
        let Some(handler) = self.models.get(model) else {
            tracing::debug!(model, "no such model registered");
            return Ok(SendingResult::NotHandled);
        };

        let outcome = match handler.dispatch(instance, payloads, now) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(model, instance, %err, "message not handled");
                return Ok(SendingResult::NotHandled);
            }
        };

        for payload in outcome.outbound {
            self.transport.deliver(model, instance, payload).await?;
        }

        tracing::debug!(model, instance, result = ?outcome.result, "batch dispatched");
        Ok(SendingResult::Handled)
    }

    /// Drain payloads delivered to the default memory transport.
    ///
    /// Empty when a custom transport was installed.
    pub fn received(&self, model: &str, instance: &str) -> Vec<Vec<u8>> {
        self.memory
            .as_ref()
            .map(|memory| memory.received(model, instance))
            .unwrap_or_default()
    }

    /// Snapshot one instance's persisted state
    pub fn instance_state<T: DeserializeOwned>(
        &self,
        model: &str,
        instance: &str,
    ) -> Result<Option<T>> {
        match self.models.get(model).and_then(|h| h.snapshot(instance)) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Number of live instances for a model
    pub fn instance_count(&self, model: &str) -> usize {
        self.models
            .get(model)
            .map(|h| h.instance_count())
            .unwrap_or(0)
    }
}
