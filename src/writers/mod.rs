//! Writer implementations
//!
//! - [`StreamWriter`]: any `io::Write`, e.g. stdout or stderr
//! - [`file::FileWriter`]: dated log files with size/day rotation
//! - [`syslog::SyslogWriter`]: local syslog daemon (unix)
//! - [`usock::SocketWriter`]: fan-out to Unix-domain socket clients (unix)
//! - [`FnWriter`] and [`NullWriter`]: adapters for closures and disabled slots

pub mod console;
#[cfg(feature = "file")]
pub mod file;
#[cfg(unix)]
pub mod syslog;
#[cfg(all(unix, feature = "unix-sockets"))]
pub mod usock;

pub use console::StreamWriter;
#[cfg(feature = "file")]
pub use file::{FileConfig, FileWriter};
#[cfg(unix)]
pub use syslog::{SyslogConfig, SyslogWriter};
#[cfg(all(unix, feature = "unix-sockets"))]
pub use usock::SocketWriter;

use crate::core::{LogRecord, Result, Writer};

/// Writer backed by a closure.
pub struct FnWriter<F> {
    f: F,
}

impl<F> FnWriter<F> {
    pub fn new(f: F) -> Self
    where
        F: FnMut(&[u8], &LogRecord<'_>) -> Result<()> + Send,
    {
        Self { f }
    }
}

impl<F> Writer for FnWriter<F>
where
    F: FnMut(&[u8], &LogRecord<'_>) -> Result<()> + Send,
{
    fn write(&mut self, bytes: &[u8], record: &LogRecord<'_>) -> Result<()> {
        (self.f)(bytes, record)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Writer that discards everything. Installed in disabled slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl Writer for NullWriter {
    fn write(&mut self, _bytes: &[u8], _record: &LogRecord<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
