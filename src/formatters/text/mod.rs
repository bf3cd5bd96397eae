//! Text formatter driven by a header template
//!
//! The header selects which record fields are rendered and how. Placeholders
//! have the form `{{name[:property][%fmtspec]}}`, e.g. `{{level:char}}`,
//! `{{line%05d}}`, `{{pkg:1}}` or `{{context:list%40s}}`:
//!
//! | name    | property                             | default       |
//! |---------|--------------------------------------|---------------|
//! | time    | `date`/`time` + `.ms`/`.us`/`.ns`, or a layout such as `15:04:05.000` | `date.us` |
//! | level   | `full` or `char`                     | `full`        |
//! | file    | number of trailing `/` segments      | `0` (all)     |
//! | line    |                                      |               |
//! | pkg     | number of trailing `::` segments     | `0` (all)     |
//! | func    | number of trailing `::` segments     | `0` (all)     |
//! | context | `pair` or `list`                     | `pair`        |
//! | prefix  |                                      |               |
//! | msg     |                                      |               |
//!
//! Any fmtspec other than the element's default (`%s`, or `%d` for `line`)
//! costs one extra copy per element. Unknown element names are left in the
//! output as written.

mod color;
mod element;
mod fmtspec;
mod header;
pub mod layout;

pub use color::{default_colors, DEFAULT_MARK_COLOR, RESET_SEQ};
pub use colored::Color;

use self::color::ColorManager;
use self::header::CompiledHeader;
use crate::core::{Formatter, LogLevel, LogRecord};
use parking_lot::Mutex;
use std::collections::HashMap;

pub const FULL_HEADER: &str =
    "{{time}} {{level}} {{file}}:{{line}} {{pkg}}.{{func}} {{prefix}}[{{context}}] {{msg}}\n";
pub const COMPACT_HEADER: &str =
    "{{time:time.us}} {{level}} {{file:1}}:{{line}} {{pkg}}.{{func}} {{prefix}}[{{context}}] {{msg}}\n";
pub const SYSLOG_HEADER: &str =
    "{{file:1}}:{{line}} {{pkg}}.{{func}} {{prefix}}[{{context}}] {{msg}}\n";

/// Configuration for [`TextFormatter`].
#[derive(Debug, Clone)]
pub struct TextConfig {
    pub header: String,
    pub coloring: bool,
    /// Overrides on top of [`default_colors`].
    pub color_map: HashMap<LogLevel, Color>,
    pub mark_color: Color,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            header: COMPACT_HEADER.to_string(),
            coloring: false,
            color_map: HashMap::new(),
            mark_color: DEFAULT_MARK_COLOR,
        }
    }
}

impl TextConfig {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_coloring(mut self, coloring: bool) -> Self {
        self.coloring = coloring;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_color(mut self, level: LogLevel, color: Color) -> Self {
        self.color_map.insert(level, color);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_mark_color(mut self, color: Color) -> Self {
        self.mark_color = color;
        self
    }
}

struct Inner {
    header: String,
    compiled: CompiledHeader,
    coloring: bool,
    colors: ColorManager,
}

/// Formatter compiled from a header template.
///
/// All state sits behind one lock, so a single instance may back several
/// slots, or several loggers, at once.
///
/// # Example
///
/// ```
/// use rust_slot_logger::core::{Formatter, LogLevel, LogRecord};
/// use rust_slot_logger::formatters::text::{TextConfig, TextFormatter};
///
/// let formatter = TextFormatter::new(TextConfig::new("{{level:char}} {{msg}}"));
/// let mut buf = Vec::new();
/// formatter.format(&LogRecord::new(LogLevel::Info, "hi"), &mut buf);
/// assert_eq!(buf, b"I hi");
/// ```
pub struct TextFormatter {
    inner: Mutex<Inner>,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                compiled: CompiledHeader::compile(&config.header),
                header: config.header,
                coloring: config.coloring,
                colors: ColorManager::new(&config.color_map, config.mark_color),
            }),
        }
    }

    pub fn header(&self) -> String {
        self.inner.lock().header.clone()
    }

    /// Recompile the formatter from a new header.
    pub fn set_header(&self, header: impl Into<String>) {
        let header = header.into();
        let compiled = CompiledHeader::compile(&header);
        let mut inner = self.inner.lock();
        inner.header = header;
        inner.compiled = compiled;
    }

    pub fn coloring(&self) -> bool {
        self.inner.lock().coloring
    }

    pub fn set_coloring(&self, coloring: bool) {
        self.inner.lock().coloring = coloring;
    }

    pub fn color(&self, level: LogLevel) -> Color {
        self.inner.lock().colors.color(level)
    }

    /// # Panics
    ///
    /// Panics if `level` is `Off`.
    pub fn set_color(&self, level: LogLevel, color: Color) {
        self.inner.lock().colors.set_color(level, color);
    }

    pub fn map_colors(&self, color_map: &HashMap<LogLevel, Color>) {
        self.inner.lock().colors.map_colors(color_map);
    }

    pub fn mark_color(&self) -> Color {
        self.inner.lock().colors.mark_color()
    }

    pub fn set_mark_color(&self, color: Color) {
        self.inner.lock().colors.set_mark_color(color);
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new(TextConfig::default())
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.coloring {
            let (left, right) = inner.colors.ears(record.level, record.aux.mark);
            buf.extend_from_slice(left.as_bytes());
            inner.compiled.render(record, buf);
            buf.extend_from_slice(right.as_bytes());
        } else {
            inner.compiled.render(record, buf);
        }
    }
}
