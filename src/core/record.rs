//! Log record structure

use super::context::Context;
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::panic::Location;

/// Placeholder for call-site fields that could not be determined.
pub const UNKNOWN: &str = "?";

/// Handle-provided data attached to a record at dispatch time.
///
/// `contexts` always lists the handle's static contexts first, in attach
/// order, followed by its resolved dynamic contexts, in attach order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auxiliary<'a> {
    pub prefix: &'a str,
    pub contexts: Cow<'a, [Context]>,
    pub mark: bool,
}

/// One log event.
///
/// Records are built by the dispatcher for the duration of a single call and
/// are handed to filters, formatters and writers by shared reference only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub file: &'a str,
    pub line: u32,
    /// Module path of the call site, `::`-separated.
    pub package: &'a str,
    /// Function path of the call site relative to `package`.
    pub function: &'a str,
    pub message: &'a str,
    pub aux: Auxiliary<'a>,
}

impl<'a> LogRecord<'a> {
    /// A record with an unknown call site and no auxiliary data, stamped now.
    pub fn new(level: LogLevel, message: &'a str) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            file: UNKNOWN,
            line: 0,
            package: UNKNOWN,
            function: UNKNOWN,
            message,
            aux: Auxiliary::default(),
        }
    }

    pub fn with_call_site(mut self, site: &CallSite) -> Self {
        self.file = site.file;
        self.line = site.line;
        self.package = site.module_path;
        self.function = site.function;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_aux(mut self, aux: Auxiliary<'a>) -> Self {
        self.aux = aux;
        self
    }
}

/// Source location a record is attributed to.
///
/// Method calls capture it through `#[track_caller]`, which only knows file and
/// line; the logging macros also fill in module path and function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub module_path: &'static str,
    pub function: &'static str,
}

impl CallSite {
    pub const fn new(
        file: &'static str,
        line: u32,
        module_path: &'static str,
        function: &'static str,
    ) -> Self {
        Self {
            file,
            line,
            module_path,
            function,
        }
    }

    /// Location of the innermost caller not annotated with `#[track_caller]`.
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            module_path: UNKNOWN,
            function: UNKNOWN,
        }
    }
}

#[doc(hidden)]
pub fn type_name_of<T>(_: &T) -> &'static str {
    std::any::type_name::<T>()
}

/// Strip the trailing helper-fn segment and the module prefix from a
/// `type_name` of a nested function, leaving the enclosing function path.
#[doc(hidden)]
pub fn function_name(type_name: &'static str, module_path: &'static str) -> &'static str {
    let name = type_name.strip_suffix("::__f").unwrap_or(type_name);
    match name
        .strip_prefix(module_path)
        .and_then(|rest| rest.strip_prefix("::"))
    {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}
