//! Unix-domain socket broadcast writer
//!
//! Listens on a socket path and accepts any number of clients on a background
//! thread. Every write is sent to all connected clients; a client whose write
//! fails is dropped.

use crate::core::{LogRecord, LoggerError, Result, Writer};
use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Clients {
    streams: Mutex<Vec<UnixStream>>,
    closed: AtomicBool,
}

pub struct SocketWriter {
    path: PathBuf,
    clients: Arc<Clients>,
    acceptor: Option<JoinHandle<()>>,
}

impl SocketWriter {
    /// Bind `path`, replacing a stale socket file, and start accepting clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the socket
    /// cannot be bound.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create socket directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(LoggerError::io_operation(
                    "remove stale socket",
                    path.display().to_string(),
                    e,
                ))
            }
        }
        let listener = UnixListener::bind(&path).map_err(|e| {
            LoggerError::io_operation("bind socket", path.display().to_string(), e)
        })?;

        let clients = Arc::new(Clients::default());
        let acceptor = {
            let clients = Arc::clone(&clients);
            thread::Builder::new()
                .name("usock-acceptor".to_string())
                .spawn(move || serve(listener, clients))
                .map_err(|e| LoggerError::io_operation("spawn acceptor", "usock", e))?
        };

        Ok(Self {
            path,
            clients,
            acceptor: Some(acceptor),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn client_count(&self) -> usize {
        self.clients.streams.lock().len()
    }

    /// Stop accepting, disconnect all clients and remove the socket file.
    pub fn close(&mut self) -> Result<()> {
        let Some(acceptor) = self.acceptor.take() else {
            return Ok(());
        };
        self.clients.closed.store(true, Ordering::SeqCst);
        // wake the blocking accept
        let _ = UnixStream::connect(&self.path);
        if acceptor.join().is_err() {
            eprintln!("[LOGGER ERROR] usock acceptor thread panicked");
        }
        self.clients.streams.lock().clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LoggerError::io_operation(
                "remove socket",
                self.path.display().to_string(),
                e,
            )),
        }
    }
}

fn serve(listener: UnixListener, clients: Arc<Clients>) {
    for stream in listener.incoming() {
        if clients.closed.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));
                clients.streams.lock().push(stream);
            }
            Err(e) => {
                eprintln!("[LOGGER ERROR] usock accept failed: {}", e);
                break;
            }
        }
    }
}

impl Writer for SocketWriter {
    fn write(&mut self, bytes: &[u8], _record: &LogRecord<'_>) -> Result<()> {
        self.clients
            .streams
            .lock()
            .retain_mut(|stream| stream.write_all(bytes).is_ok());
        Ok(())
    }

    fn name(&self) -> &str {
        "usock"
    }
}

impl Drop for SocketWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close socket writer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::{BufRead, BufReader};
    use std::net::Shutdown;
    use std::time::Instant;
    use tempfile::TempDir;

    fn wait_for_clients(writer: &SocketWriter, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while writer.client_count() < n && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(writer.client_count(), n);
    }

    #[test]
    fn test_fan_out_to_all_clients() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sock").join("log.sock");
        let mut writer = SocketWriter::open(&path).unwrap();

        let a = UnixStream::connect(&path).unwrap();
        let b = UnixStream::connect(&path).unwrap();
        wait_for_clients(&writer, 2);

        let record = LogRecord::new(LogLevel::Info, "hello");
        writer.write(b"hello\n", &record).unwrap();

        for client in [a, b] {
            let mut line = String::new();
            BufReader::new(client).read_line(&mut line).unwrap();
            assert_eq!(line, "hello\n");
        }
        writer.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drops_failed_clients() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.sock");
        let mut writer = SocketWriter::open(&path).unwrap();

        let client = UnixStream::connect(&path).unwrap();
        wait_for_clients(&writer, 1);
        client.shutdown(Shutdown::Both).unwrap();
        drop(client);

        let record = LogRecord::new(LogLevel::Info, "x");
        let deadline = Instant::now() + Duration::from_secs(5);
        while writer.client_count() > 0 && Instant::now() < deadline {
            writer.write(b"x\n", &record).unwrap();
        }
        assert_eq!(writer.client_count(), 0);
    }
}
