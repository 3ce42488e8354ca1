//! Buffered, batched log delivery for short-lived request handlers.
//!
//! An [`EdgeLogger`] collects records for one request without touching the
//! network, and ships them as a JSON array to a dataset ingest endpoint when
//! either enough records are buffered or enough time has passed. Deliveries
//! run as deferred background work registered with the host and never
//! overlap; records are only dropped from the buffer once the batch holding
//! them was accepted.

pub mod buffer;
pub mod config;
pub mod deferred;
pub mod env;
pub mod error;
pub mod fallback;
pub mod flush;
pub mod format;
pub mod id;
pub mod init;
pub mod layer;
pub mod logger;
pub mod noop_sink;
pub mod pretty;
pub mod record;
pub mod scheduler;
pub mod sink;

#[cfg(feature = "http")]
pub mod http;

pub use config::LoggerConfig;
pub use deferred::{DeferredWork, TaskQueue};
pub use flush::FlushOptions;
pub use format::ErrorValue;
pub use logger::{EdgeLogger, EdgeLoggerBuilder};
pub use record::{Fields, Level, LogRecord};
pub use sink::{IngestRequest, IngestResponse, IngestSink};
