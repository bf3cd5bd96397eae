//! Formatter trait for rendering records

use super::record::LogRecord;
use std::sync::Arc;

/// Renders a record into bytes.
///
/// `format` appends to `buf`, which the dispatcher owns, clears before each
/// call and reuses across calls; the rendered bytes are only valid until the
/// next record is formatted into the same buffer.
///
/// The dispatcher serializes calls per logger. A formatter shared between
/// several loggers must protect its own state.
///
/// A panic in `format` is caught and reported to the slot's error handler;
/// the remaining slots still receive the record. Panics in filters and
/// dynamic context generators are not caught and reach the logging call.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord<'_>, buf: &mut Vec<u8>);

    /// Whether two slots holding this same instance may share one rendering
    /// of a record. Formatters whose output is not a pure function of the
    /// record should return `false`.
    fn supports_identity(&self) -> bool {
        true
    }
}

/// Shared formatter handle as stored in slots.
pub type SharedFormatter = Arc<dyn Formatter>;

/// Whether `a` and `b` are the same identity-comparable formatter instance.
pub(crate) fn same_formatter(a: &SharedFormatter, b: &SharedFormatter) -> bool {
    a.supports_identity()
        && b.supports_identity()
        && std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
