//! # Rust Slot Logger
//!
//! A structured logging core that routes every record through a fixed table of
//! eight output slots, each with its own formatter, writer, level, filter and
//! error handler.
//!
//! ## Features
//!
//! - **Cheap handles**: `with_prefix`, `with_contexts`, `with_mark`, ... return
//!   new handles sharing one root; the original handle never changes
//! - **Slot routing**: up to eight destinations with independent verbosity
//! - **Format once**: slots sharing a formatter instance share its output
//! - **Header templates**: `{{time}} {{level}} {{file:1}}:{{line}} {{msg}}`
//!   compiled once, with optional per-level coloring
//! - **Writers**: streams, rotating files, syslog and Unix socket fan-out
//!
//! ## Example
//!
//! ```
//! use rust_slot_logger::prelude::*;
//! use rust_slot_logger::info;
//! use std::sync::Arc;
//!
//! let logger = Logger::builder()
//!     .slot(
//!         Slot::Slot0,
//!         SlotConfig::new(
//!             Arc::new(TextFormatter::new(TextConfig::new(COMPACT_HEADER))),
//!             writer::shared(StreamWriter::stderr()),
//!         ),
//!     )
//!     .build();
//!
//! let conn = logger.with_contexts([("peer", "10.0.0.7")]);
//! info!(conn, "accepted after {} ms", 12);
//! ```

pub mod core;
pub mod defaults;
pub mod formatters;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::core::filter::{self, Filter};
    pub use crate::core::writer;
    pub use crate::core::{
        CallSite, Context, ContextValue, Dynamic, ErrorHandler, Formatter, LogLevel, LogRecord,
        Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Result, Slot, SlotConfig,
        Timing, Writer,
    };
    pub use crate::formatters::{
        JsonConfig, JsonFormatter, TextConfig, TextFormatter, COMPACT_HEADER, FULL_HEADER,
    };
    pub use crate::writers::StreamWriter;
}

pub use crate::core::{
    CallSite, Context, ContextValue, Dynamic, Filter, Formatter, LogLevel, LogRecord, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Result, Slot, SlotConfig, Timing,
    Writer,
};
