//! Core logger types and traits

pub mod context;
pub mod error;
pub mod error_handler;
pub mod filter;
pub mod formatter;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod slots;
pub mod writer;

pub use context::{Context, ContextValue, Dynamic};
pub use error::{LoggerError, Result};
pub use error_handler::ErrorHandler;
pub use filter::Filter;
pub use formatter::{Formatter, SharedFormatter};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, LoggerConfig, Timing};
pub use metrics::LoggerMetrics;
pub use record::{Auxiliary, CallSite, LogRecord};
pub use slots::{Slot, SlotConfig, SLOT_COUNT};
pub use writer::{SharedWriter, Writer};
