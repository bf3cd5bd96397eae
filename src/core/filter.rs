//! Record filters and their combinators
//!
//! A filter is a predicate over a [`LogRecord`]. Wherever a filter is optional
//! (loggers, handles, slots), an absent filter accepts every record, so
//! `not(None)` rejects everything.
//!
//! Filters run while the logger lock is held. A filter must not log through
//! the logger it is installed on, or it will deadlock.

use super::log_level::LogLevel;
use super::record::LogRecord;
use std::fmt;
use std::sync::Arc;

/// A cloneable, thread-safe record predicate.
///
/// # Example
///
/// ```
/// use rust_slot_logger::core::filter::{self, Filter};
/// use rust_slot_logger::core::{LogLevel, LogRecord};
///
/// let errors_or_marked = filter::or([filter::min_level(LogLevel::Error), filter::marked()]);
/// assert!(!errors_or_marked.matches(&LogRecord::new(LogLevel::Info, "hi")));
/// assert!(errors_or_marked.matches(&LogRecord::new(LogLevel::Error, "boom")));
/// ```
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&LogRecord<'_>) -> bool + Send + Sync>);

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&LogRecord<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    pub fn reject_all() -> Self {
        Self::new(|_| false)
    }

    #[inline]
    pub fn matches(&self, record: &LogRecord<'_>) -> bool {
        (self.0)(record)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

impl From<Option<Filter>> for Filter {
    fn from(filter: Option<Filter>) -> Self {
        filter.unwrap_or_else(Filter::accept_all)
    }
}

/// Evaluate an optional filter, treating `None` as accept-all.
#[inline]
pub fn accepts(filter: Option<&Filter>, record: &LogRecord<'_>) -> bool {
    filter.map_or(true, |f| f.matches(record))
}

/// True iff every filter accepts; stops at the first rejection. Empty → true.
pub fn and<I>(filters: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    let filters: Vec<Filter> = filters.into_iter().map(Into::into).collect();
    Filter::new(move |record| filters.iter().all(|f| f.matches(record)))
}

/// True iff any filter accepts; stops at the first acceptance. Empty → false.
pub fn or<I>(filters: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    let filters: Vec<Filter> = filters.into_iter().map(Into::into).collect();
    Filter::new(move |record| filters.iter().any(|f| f.matches(record)))
}

/// Negation. An absent filter is accept-all, so `not(None)` rejects all.
pub fn not(filter: impl Into<Filter>) -> Filter {
    let filter = filter.into();
    Filter::new(move |record| !filter.matches(record))
}

/// Accept records at or above `level`.
pub fn min_level(level: LogLevel) -> Filter {
    Filter::new(move |record| record.level >= level)
}

/// Accept records emitted through a marked handle.
pub fn marked() -> Filter {
    Filter::new(|record| record.aux.mark)
}

/// Accept records carrying a context with the given key.
pub fn has_context(key: impl Into<String>) -> Filter {
    let key = key.into();
    Filter::new(move |record| record.aux.contexts.iter().any(|c| c.key == key))
}
