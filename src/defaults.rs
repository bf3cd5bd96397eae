//! Process-wide default logger
//!
//! The core keeps no global state; this module is the bootstrap layer for
//! applications that want one shared logger without wiring it themselves.
//! Both values are built on first use.
//!
//! The default logger writes every level to stderr through slot 0, using
//! [`default_formatter`]: the compact header with coloring enabled.

use crate::core::{writer, Logger, SharedFormatter, Slot, SlotConfig};
use crate::formatters::text::{TextConfig, TextFormatter, COMPACT_HEADER};
use crate::writers::StreamWriter;
use std::sync::{Arc, OnceLock};

static DEFAULT_FORMATTER: OnceLock<Arc<TextFormatter>> = OnceLock::new();
static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The formatter installed in the default logger's slot 0.
///
/// Changes made through it, such as [`TextFormatter::set_header`], apply to
/// the default logger.
pub fn default_formatter() -> &'static Arc<TextFormatter> {
    DEFAULT_FORMATTER.get_or_init(|| {
        Arc::new(TextFormatter::new(
            TextConfig::new(COMPACT_HEADER).with_coloring(true),
        ))
    })
}

/// The process-wide logger.
///
/// # Example
///
/// ```
/// use rust_slot_logger::defaults::default_logger;
/// use rust_slot_logger::LogLevel;
///
/// let log = default_logger().with_prefix("[boot] ");
/// log.set_level(LogLevel::Warn);
/// log.info("not shown");
/// ```
pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| {
        let formatter: SharedFormatter = Arc::clone(default_formatter()) as SharedFormatter;
        Logger::builder()
            .slot(
                Slot::Slot0,
                SlotConfig::new(formatter, writer::shared(StreamWriter::stderr())),
            )
            .build()
    })
}
