//! In-memory host environment for exercising twin models
//!
//! Stands in for the hosting runtime in tests and demos:
//! - Model registry and message routing by (model, instance id)
//! - First-contact twin creation and per-instance state
//! - Asynchronous data-source delivery behind a transport seam
//!
//! The real host owns persistence, wire decoding, and delivery guarantees;
//! this environment fakes just enough of them to drive processors end to end.

pub mod context;
pub mod environment;
pub mod transport;

pub use context::RecordingContext;
pub use environment::{MockEnvironment, MockEnvironmentBuilder, SendingResult};
pub use transport::{DataSourceTransport, MemoryTransport};
