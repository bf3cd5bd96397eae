//! Formatter implementations
//!
//! - [`text::TextFormatter`]: compiles a header template into a renderer pipeline
//! - [`json::JsonFormatter`]: one JSON object per line
//! - [`FnFormatter`] and [`NullFormatter`]: adapters for closures and for
//!   disabled slots

pub mod json;
pub mod text;

pub use json::{JsonConfig, JsonFormatter};
pub use text::{TextConfig, TextFormatter, COMPACT_HEADER, FULL_HEADER, SYSLOG_HEADER};

use crate::core::{Formatter, LogRecord};

/// Formatter backed by a closure.
///
/// Closures carry no identity, so slots sharing one `FnFormatter` each format
/// the record themselves.
pub struct FnFormatter<F> {
    f: F,
}

impl<F> FnFormatter<F> {
    pub fn new(f: F) -> Self
    where
        F: Fn(&LogRecord<'_>, &mut Vec<u8>) + Send + Sync,
    {
        Self { f }
    }
}

impl<F> Formatter for FnFormatter<F>
where
    F: Fn(&LogRecord<'_>, &mut Vec<u8>) + Send + Sync,
{
    fn format(&self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        (self.f)(record, buf)
    }

    fn supports_identity(&self) -> bool {
        false
    }
}

/// Formatter that renders nothing. Installed in disabled slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFormatter;

impl Formatter for NullFormatter {
    fn format(&self, _record: &LogRecord<'_>, _buf: &mut Vec<u8>) {}

    fn supports_identity(&self) -> bool {
        false
    }
}

/// Keep the last `n` `sep`-separated segments of `s`; `n == 0` keeps everything.
///
/// A separator at the very start of `s` is never a cut point, so `"/a"`
/// truncated to one segment stays `"/a"`.
pub fn last_segments<'a>(s: &'a str, n: usize, sep: &str) -> &'a str {
    if n == 0 || sep.is_empty() {
        return s;
    }
    let mut end = s.len();
    let mut remaining = n;
    while let Some(idx) = s[..end].rfind(sep) {
        if idx == 0 {
            break;
        }
        remaining -= 1;
        if remaining == 0 {
            return &s[idx + sep.len()..];
        }
        end = idx;
    }
    s
}
