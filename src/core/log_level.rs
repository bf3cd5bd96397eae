//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record, and the threshold type of loggers, handles and slots.
///
/// `Off` is only meaningful as a threshold: it compares greater than `Fatal`,
/// so anything configured with `Off` rejects every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    #[default]
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

/// Number of levels a record can carry (`Off` excluded).
pub const LEVEL_COUNT: usize = 6;

impl LogLevel {
    /// All levels a record can be emitted at, in ascending order.
    pub const RECORD_LEVELS: [LogLevel; LEVEL_COUNT] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    /// Whether a record at `self` passes a `threshold`.
    #[inline]
    pub fn passes(self, threshold: LogLevel) -> bool {
        self >= threshold
    }

    /// Whether `self` may be carried by a record.
    #[inline]
    pub fn is_record_level(self) -> bool {
        self != LogLevel::Off
    }

    /// Index into per-level tables of length [`LEVEL_COUNT`].
    ///
    /// # Panics
    ///
    /// Panics for `Off`, which has no per-level slot.
    #[inline]
    pub fn index(self) -> usize {
        check_level(self);
        self as usize
    }
}

/// Asserts that `level` can be carried by a record.
///
/// # Panics
///
/// Panics for `Off`; logging at `Off` is a usage error.
#[inline]
pub(crate) fn check_level(level: LogLevel) {
    if !level.is_record_level() {
        panic!("rust_slot_logger: invalid log level: {}", level);
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "OFF" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
