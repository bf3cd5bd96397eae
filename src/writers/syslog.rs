//! Writer for the local syslog daemon
//!
//! Messages are sent over a Unix socket as
//! `<PRI>Mmm dd hh:mm:ss tag[pid]: msg`. A failed write triggers one
//! reconnect and one retry before the error is returned.

use crate::core::log_level::{LogLevel, LEVEL_COUNT};
use crate::core::{LogRecord, LoggerError, Result, Writer};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::path::PathBuf;

const SOCKET_PATHS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facility {
    Kern = 0,
    User = 1 << 3,
    Mail = 2 << 3,
    Daemon = 3 << 3,
    Auth = 4 << 3,
    Syslog = 5 << 3,
    Lpr = 6 << 3,
    News = 7 << 3,
    Uucp = 8 << 3,
    Cron = 9 << 3,
    AuthPriv = 10 << 3,
    Ftp = 11 << 3,
    Local0 = 16 << 3,
    Local1 = 17 << 3,
    Local2 = 18 << 3,
    Local3 = 19 << 3,
    Local4 = 20 << 3,
    Local5 = 21 << 3,
    Local6 = 22 << 3,
    Local7 = 23 << 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

/// Default level to severity mapping.
pub fn default_severities() -> HashMap<LogLevel, Severity> {
    HashMap::from([
        (LogLevel::Trace, Severity::Debug),
        (LogLevel::Debug, Severity::Debug),
        (LogLevel::Info, Severity::Info),
        (LogLevel::Warn, Severity::Warning),
        (LogLevel::Error, Severity::Err),
        (LogLevel::Fatal, Severity::Crit),
    ])
}

#[derive(Debug, Clone)]
pub struct SyslogConfig {
    /// Defaults to the executable name.
    pub tag: String,
    pub facility: Facility,
    /// Overrides on top of [`default_severities`].
    pub severity_map: HashMap<LogLevel, Severity>,
    /// Socket to send to instead of the well-known syslog paths.
    pub socket_path: Option<PathBuf>,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        let tag = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "app".to_string());
        Self {
            tag,
            facility: Facility::User,
            severity_map: HashMap::new(),
            socket_path: None,
        }
    }
}

impl SyslogConfig {
    #[must_use = "builder methods return a new value"]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_severity(mut self, level: LogLevel, severity: Severity) -> Self {
        self.severity_map.insert(level, severity);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }
}

enum Conn {
    Datagram(UnixDatagram),
    Stream(UnixStream),
}

impl Conn {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        match self {
            Conn::Datagram(sock) => sock.send(frame).map(|_| ()),
            Conn::Stream(sock) => sock.write_all(frame),
        }
    }
}

pub struct SyslogWriter {
    tag: String,
    facility: Facility,
    severities: [Severity; LEVEL_COUNT],
    socket_path: Option<PathBuf>,
    conn: Option<Conn>,
    frame: Vec<u8>,
}

impl SyslogWriter {
    /// Connect to the syslog daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if no syslog socket accepts a connection.
    pub fn open(config: SyslogConfig) -> Result<Self> {
        let mut writer = Self {
            tag: config.tag,
            facility: config.facility,
            severities: [Severity::Debug; LEVEL_COUNT],
            socket_path: config.socket_path,
            conn: None,
            frame: Vec::with_capacity(256),
        };
        writer.map_severities(&default_severities());
        writer.map_severities(&config.severity_map);
        writer.conn = Some(writer.connect()?);
        Ok(writer)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn set_facility(&mut self, facility: Facility) {
        self.facility = facility;
    }

    pub fn severity(&self, level: LogLevel) -> Severity {
        self.severities[level.index()]
    }

    pub fn set_severity(&mut self, level: LogLevel, severity: Severity) {
        self.severities[level.index()] = severity;
    }

    pub fn map_severities(&mut self, map: &HashMap<LogLevel, Severity>) {
        for (&level, &severity) in map {
            self.set_severity(level, severity);
        }
    }

    /// Drop the connection. The next write reconnects.
    pub fn close(&mut self) {
        self.conn = None;
    }

    fn connect(&self) -> Result<Conn> {
        let paths: Vec<PathBuf> = match &self.socket_path {
            Some(path) => vec![path.clone()],
            None => SOCKET_PATHS.iter().map(PathBuf::from).collect(),
        };
        for path in &paths {
            if let Ok(sock) = UnixDatagram::unbound().and_then(|s| s.connect(path).map(|_| s)) {
                return Ok(Conn::Datagram(sock));
            }
        }
        for path in &paths {
            if let Ok(sock) = UnixStream::connect(path) {
                return Ok(Conn::Stream(sock));
            }
        }
        Err(LoggerError::syslog("Unix syslog delivery error"))
    }

    fn build_frame(&mut self, timestamp: &DateTime<Local>, priority: u8, msg: &[u8]) {
        self.frame.clear();
        let _ = write!(
            self.frame,
            "<{}>{} {}[{}]: ",
            priority,
            timestamp.format("%b %e %H:%M:%S"),
            self.tag,
            std::process::id()
        );
        self.frame.extend_from_slice(msg);
    }

    fn send(&mut self) -> std::io::Result<()> {
        match self.conn.as_mut() {
            Some(conn) => conn.send(&self.frame),
            None => Err(std::io::Error::from(std::io::ErrorKind::NotConnected)),
        }
    }
}

impl Writer for SyslogWriter {
    fn write(&mut self, bytes: &[u8], record: &LogRecord<'_>) -> Result<()> {
        let priority = self.facility as u8 | self.severity(record.level) as u8;
        self.build_frame(&record.timestamp, priority, bytes);

        if self.conn.is_some() && self.send().is_ok() {
            return Ok(());
        }
        self.conn = None;
        self.conn = Some(self.connect()?);
        if let Err(e) = self.send() {
            self.conn = None;
            return Err(LoggerError::syslog(e.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "syslog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_frame_and_priority() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.sock");
        let server = UnixDatagram::bind(&path).unwrap();

        let config = SyslogConfig::default()
            .with_tag("svc")
            .with_facility(Facility::Local0)
            .with_socket_path(&path);
        let mut writer = SyslogWriter::open(config).unwrap();
        assert_eq!(writer.severity(LogLevel::Warn), Severity::Warning);

        let ts = Local.with_ymd_and_hms(2024, 3, 5, 8, 9, 10).single().unwrap();
        let record = LogRecord::new(LogLevel::Warn, "disk").with_timestamp(ts);
        writer.write(b"disk\n", &record).unwrap();

        let mut buf = [0u8; 256];
        let n = server.recv(&mut buf).unwrap();
        let frame = String::from_utf8_lossy(&buf[..n]).into_owned();
        assert_eq!(
            frame,
            format!("<132>Mar  5 08:09:10 svc[{}]: disk\n", std::process::id())
        );
    }

    #[test]
    fn test_reconnects_after_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.sock");
        let server = UnixDatagram::bind(&path).unwrap();
        let mut writer =
            SyslogWriter::open(SyslogConfig::default().with_socket_path(&path)).unwrap();

        drop(server);
        std::fs::remove_file(&path).unwrap();
        let server = UnixDatagram::bind(&path).unwrap();

        let record = LogRecord::new(LogLevel::Info, "again");
        writer.write(b"again", &record).unwrap();
        let mut buf = [0u8; 256];
        let n = server.recv(&mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).ends_with("again"));
    }

    #[test]
    fn test_open_fails_without_daemon() {
        let temp = TempDir::new().unwrap();
        let config = SyslogConfig::default().with_socket_path(temp.path().join("missing.sock"));
        assert!(SyslogWriter::open(config).is_err());
    }
}
