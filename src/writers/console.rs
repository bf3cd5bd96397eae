//! Stream writer for stdout, stderr or any `io::Write`

use crate::core::{LogRecord, Result, Writer};
use std::io::{self, Write};

pub struct StreamWriter<W> {
    stream: W,
    name: &'static str,
}

impl<W: Write + Send> StreamWriter<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            name: "stream",
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

impl StreamWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            stream: io::stdout(),
            name: "stdout",
        }
    }
}

impl StreamWriter<io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            stream: io::stderr(),
            name: "stderr",
        }
    }
}

impl<W: Write + Send> Writer for StreamWriter<W> {
    fn write(&mut self, bytes: &[u8], _record: &LogRecord<'_>) -> Result<()> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_writes_reach_stream() {
        let mut writer = StreamWriter::new(Vec::new());
        let record = LogRecord::new(LogLevel::Info, "x");
        writer.write(b"one\n", &record).unwrap();
        writer.write(b"two\n", &record).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"one\ntwo\n");
    }

    #[test]
    fn test_names() {
        assert_eq!(StreamWriter::stdout().name(), "stdout");
        assert_eq!(StreamWriter::stderr().name(), "stderr");
        assert_eq!(StreamWriter::new(Vec::new()).name(), "stream");
    }
}
