//! Handlers invoked when a slot's writer fails

use super::error::LoggerError;
use super::record::LogRecord;
use std::sync::Arc;

/// Called with the formatted bytes, the record and the writer's error.
/// When the slot's formatter panicked, the bytes are empty.
///
/// Runs while the logger lock is held; it must not log through the same logger.
pub type ErrorHandler = Arc<dyn Fn(&[u8], &LogRecord<'_>, &LoggerError) + Send + Sync>;

/// Report the error on stderr.
pub fn report(_bytes: &[u8], record: &LogRecord<'_>, err: &LoggerError) {
    eprintln!(
        "[LOGGER ERROR] Write failed for record at {}:{}: {}",
        record.file, record.line, err
    );
}

/// Report the error and the undelivered output on stderr.
pub fn report_details(bytes: &[u8], record: &LogRecord<'_>, err: &LoggerError) {
    eprintln!(
        "[LOGGER ERROR] Write failed for record at {}:{}: {}, log: {}",
        record.file,
        record.line,
        err,
        String::from_utf8_lossy(bytes).trim_end()
    );
}

/// Wrap a closure as an [`ErrorHandler`].
pub fn from_fn<F>(handler: F) -> ErrorHandler
where
    F: Fn(&[u8], &LogRecord<'_>, &LoggerError) + Send + Sync + 'static,
{
    Arc::new(handler)
}

pub fn reporting() -> ErrorHandler {
    Arc::new(report)
}

pub fn reporting_details() -> ErrorHandler {
    Arc::new(report_details)
}
