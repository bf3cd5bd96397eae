//! Logging macros for ergonomic log message formatting.
//!
//! Unlike the plain methods, the macros record the module path and the
//! enclosing function of the call site, so `{{pkg}}` and `{{func}}` header
//! elements have something to show. Formatting of the arguments is skipped
//! when the level is disabled.
//!
//! # Examples
//!
//! ```
//! use rust_slot_logger::prelude::*;
//! use rust_slot_logger::info;
//!
//! let logger = Logger::new();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// The [`CallSite`](crate::core::CallSite) of the macro invocation, with
/// module path and function name filled in.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::core::CallSite::new(file!(), line!(), module_path!(), {
            fn __f() {}
            $crate::core::record::function_name(
                $crate::core::record::type_name_of(&__f),
                module_path!(),
            )
        })
    };
}

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_slot_logger::prelude::*;
/// # let logger = Logger::new();
/// use rust_slot_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at($crate::call_site!(), $level, format_args!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_slot_logger::prelude::*;
/// # let logger = Logger::new();
/// use rust_slot_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message, flush and exit the process with status 1.
///
/// # Examples
///
/// ```no_run
/// # use rust_slot_logger::prelude::*;
/// # let logger = Logger::new();
/// use rust_slot_logger::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal_at($crate::call_site!(), format_args!($($arg)+))
    };
}

/// Log a fatal-level message, then panic with it.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {
        $logger.panic_at($crate::call_site!(), format_args!($($arg)+))
    };
}

/// Log an error-level message and evaluate to a
/// [`LoggerError::Logged`](crate::core::LoggerError::Logged) carrying it.
///
/// # Examples
///
/// ```
/// # use rust_slot_logger::prelude::*;
/// # let logger = Logger::new();
/// use rust_slot_logger::logged_error;
/// fn connect(logger: &Logger, port: u16) -> Result<()> {
///     Err(logged_error!(logger, "port {} refused", port))
/// }
/// assert!(connect(&logger, 80).is_err());
/// ```
#[macro_export]
macro_rules! logged_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.logged_error_at($crate::call_site!(), format_args!($($arg)+))
    };
}

/// Start a timed span; see [`Logger::timing`](crate::core::Logger::timing).
#[macro_export]
macro_rules! timing {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.timing_at($crate::call_site!(), $level, format!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{writer, LogLevel, LogRecord, Logger, LoggerError, Slot, SlotConfig};
    use crate::formatters::text::{TextConfig, TextFormatter};
    use crate::writers::FnWriter;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn capture(header: &str) -> (Logger, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger = Logger::builder()
            .slot(
                Slot::Slot0,
                SlotConfig::new(
                    Arc::new(TextFormatter::new(TextConfig::new(header))),
                    writer::shared(FnWriter::new(move |bytes: &[u8], _: &LogRecord<'_>| {
                        sink.lock().push(String::from_utf8_lossy(bytes).into_owned());
                        Ok(())
                    })),
                ),
            )
            .build();
        (logger, lines)
    }

    #[test]
    fn test_log_macro() {
        let (logger, lines) = capture("{{level:char}} {{msg}}");
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Warn, "Formatted: {}", 42);
        assert_eq!(*lines.lock(), vec!["I Test message", "W Formatted: 42"]);
    }

    #[test]
    fn test_level_macros() {
        let (logger, lines) = capture("{{level:char}}");
        trace!(logger, "t");
        debug!(logger, "d {}", 1);
        info!(logger, "i");
        warn!(logger, "w");
        error!(logger, "e");
        assert_eq!(*lines.lock(), vec!["T", "D", "I", "W", "E"]);
    }

    #[test]
    fn test_call_site_names() {
        let (logger, lines) = capture("{{pkg}} {{func}} {{file:1}}");
        info!(logger, "x");
        assert_eq!(
            *lines.lock(),
            vec!["rust_slot_logger::macros::tests test_call_site_names macros.rs"]
        );
    }

    #[test]
    fn test_call_site_macro() {
        let site = call_site!();
        assert_eq!(site.line, line!() - 1);
        assert_eq!(site.module_path, module_path!());
        assert_eq!(site.function, "test_call_site_macro");
    }

    #[test]
    fn test_disabled_level_skips_formatting() {
        struct Loud;
        impl std::fmt::Display for Loud {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                panic!("formatted a disabled record")
            }
        }
        let (logger, lines) = capture("{{msg}}");
        logger.set_level(LogLevel::Error);
        info!(logger, "{}", Loud);
        assert!(lines.lock().is_empty());
    }

    #[test]
    fn test_logged_error_macro() {
        let (logger, lines) = capture("{{msg}}");
        let err = logged_error!(logger, "code {}", 500);
        assert!(matches!(err, LoggerError::Logged(ref m) if m == "code 500"));
        assert_eq!(*lines.lock(), vec!["code 500"]);
    }

    #[test]
    fn test_timing_macro() {
        let (logger, lines) = capture("{{msg}}");
        timing!(logger, LogLevel::Info, "step {}", 3).stop();
        assert!(lines.lock()[0].starts_with("step 3 (cost: "));
    }

    #[test]
    fn test_panic_log_macro() {
        let (logger, lines) = capture("{{msg}}");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            panic_log!(logger, "invariant {}", "broken")
        }));
        assert!(result.is_err());
        assert_eq!(*lines.lock(), vec!["invariant broken"]);
    }
}
