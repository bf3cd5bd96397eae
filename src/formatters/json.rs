//! JSON formatter
//!
//! Renders one JSON object per line:
//!
//! ```text
//! {"Time":"...","Level":2,"File":"...","Line":7,"Pkg":"...","Func":"...",
//!  "Msg":"...","Prefix":"...","Contexts":[{"Key":"k","Value":"v"}],"Mark":false}
//! ```

use crate::core::{Formatter, LogRecord};
use crate::formatters::last_segments;
use chrono::{DateTime, SecondsFormat, TimeZone};
use std::fmt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Path truncation per field; `0` keeps the full value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConfig {
    pub file_segments: usize,
    pub pkg_segments: usize,
    pub func_segments: usize,
}

impl JsonConfig {
    #[must_use = "builder methods return a new value"]
    pub fn with_file_segments(mut self, segments: usize) -> Self {
        self.file_segments = segments;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_pkg_segments(mut self, segments: usize) -> Self {
        self.pkg_segments = segments;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_func_segments(mut self, segments: usize) -> Self {
        self.func_segments = segments;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonContext<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonRecord<'a> {
    time: String,
    level: u8,
    file: &'a str,
    line: u32,
    pkg: &'a str,
    func: &'a str,
    msg: &'a str,
    prefix: &'a str,
    contexts: Vec<JsonContext<'a>>,
    mark: bool,
}

pub struct JsonFormatter {
    config: Mutex<JsonConfig>,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    pub fn config(&self) -> JsonConfig {
        *self.config.lock()
    }

    pub fn set_file_segments(&self, segments: usize) {
        self.config.lock().file_segments = segments;
    }

    pub fn set_pkg_segments(&self, segments: usize) {
        self.config.lock().pkg_segments = segments;
    }

    pub fn set_func_segments(&self, segments: usize) {
        self.config.lock().func_segments = segments;
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(JsonConfig::default())
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        let config = self.config();
        let json = JsonRecord {
            time: rfc3339_nano(&record.timestamp),
            level: record.level as u8,
            file: last_segments(record.file, config.file_segments, "/"),
            line: record.line,
            pkg: last_segments(record.package, config.pkg_segments, "::"),
            func: last_segments(record.function, config.func_segments, "::"),
            msg: record.message,
            prefix: record.aux.prefix,
            contexts: record
                .aux
                .contexts
                .iter()
                .map(|c| JsonContext {
                    key: &c.key,
                    value: &c.value,
                })
                .collect(),
            mark: record.aux.mark,
        };
        if let Err(e) = serde_json::to_writer(&mut *buf, &json) {
            eprintln!("[LOGGER ERROR] Failed to serialize record: {}", e);
            return;
        }
        buf.push(b'\n');
    }
}

/// RFC 3339 with up to nine fractional digits, trailing zeros removed.
fn rfc3339_nano<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let full = ts.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let Some(dot) = full.find('.') else {
        return full;
    };
    let end = dot + 10;
    let fraction = full[dot + 1..end].trim_end_matches('0');
    let mut out = String::with_capacity(full.len());
    out.push_str(&full[..dot]);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out.push_str(&full[end..]);
    out
}
