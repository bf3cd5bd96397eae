//! Writer trait for log output destinations

use super::{error::Result, record::LogRecord};
use parking_lot::Mutex;
use std::sync::Arc;

/// Delivers formatted bytes to a destination.
///
/// Writes for one logger never overlap: the dispatcher holds the logger lock
/// for the whole format/write phase. A writer must not log through the logger
/// it is installed on, or it will deadlock.
pub trait Writer: Send {
    fn write(&mut self, bytes: &[u8], record: &LogRecord<'_>) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Shared writer handle as stored in slots; one writer may back several slots.
pub type SharedWriter = Arc<Mutex<dyn Writer>>;

/// Wrap a writer for installation into a slot.
pub fn shared<W: Writer + 'static>(writer: W) -> SharedWriter {
    Arc::new(Mutex::new(writer))
}
