//! File writer with day and size based rotation
//!
//! Files are laid out as `<dir>/<YYYYMMDD>/<HHMMSS.micros>.log`, named after
//! the timestamp of the first record they hold. A new file is started when a
//! record falls on a different day than the current file, or when the current
//! file has reached the configured size. Every few seconds the writer also
//! checks that its file still exists and recreates it if it was removed.

use crate::core::{LogRecord, LoggerError, Result, Writer};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default rotation size: 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;
/// How often the writer verifies that its file still exists.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

const EXTENSION: &str = "log";

/// Configuration for [`FileWriter`]
///
/// # Examples
///
/// ```
/// use rust_slot_logger::writers::FileConfig;
///
/// let config = FileConfig::new("/var/log/app")
///     .with_max_file_size(50 * 1024 * 1024)
///     .with_compression(true);
/// assert!(config.compress);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    /// Root directory; dated subdirectories are created below it.
    pub dir: PathBuf,
    pub max_file_size: u64,
    /// Gzip each file once the writer moves on to the next one.
    pub compress: bool,
    pub check_interval: Duration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            compress: false,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl FileConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }
}

/// `<executable name>.<pid>` in the working directory.
fn default_dir() -> PathBuf {
    let exe = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "app".to_string());
    PathBuf::from(format!("{}.{}", exe, std::process::id()))
}

struct CurrentFile {
    writer: BufWriter<File>,
    path: PathBuf,
    day: NaiveDate,
    size: u64,
    checked_at: Instant,
}

pub struct FileWriter {
    config: FileConfig,
    current: Option<CurrentFile>,
}

impl FileWriter {
    /// Create the root directory and a writer over it. No file is opened until
    /// the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the maximum size is zero or the directory cannot be
    /// created.
    pub fn open(config: FileConfig) -> Result<Self> {
        check_config(&config)?;
        Ok(Self {
            config,
            current: None,
        })
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Path of the file currently written to, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    /// Switch to a new root directory. The current file is finished first.
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        if dir == self.config.dir {
            return Ok(());
        }
        let mut config = self.config.clone();
        config.dir = dir;
        check_config(&config)?;
        self.finish_current()?;
        self.config = config;
        Ok(())
    }

    pub fn set_max_file_size(&mut self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(LoggerError::config(
                "FileWriter",
                "max_file_size must be positive",
            ));
        }
        self.config.max_file_size = size;
        Ok(())
    }

    /// Make sure a usable file is open for a record stamped `timestamp`.
    fn check_file(&mut self, timestamp: &DateTime<Local>) -> Result<()> {
        let needs_new = match &self.current {
            None => true,
            Some(current) => {
                current.day != timestamp.date_naive() || current.size >= self.config.max_file_size
            }
        };
        if needs_new {
            self.finish_current()?;
            return self.create_file(timestamp);
        }

        let interval = self.config.check_interval;
        if let Some(current) = self.current.as_mut() {
            if current.checked_at.elapsed() >= interval {
                current.checked_at = Instant::now();
                match fs::metadata(&current.path) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        // removed behind our back; the buffered tail goes with it
                        self.current = None;
                        return self.create_file(timestamp);
                    }
                    Err(e) => {
                        return Err(LoggerError::file_writer(
                            current.path.display().to_string(),
                            format!("Cannot access file metadata: {}", e),
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    fn create_file(&mut self, timestamp: &DateTime<Local>) -> Result<()> {
        let day_dir = self.config.dir.join(timestamp.format("%Y%m%d").to_string());
        fs::create_dir_all(&day_dir).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", day_dir.display()),
                e,
            )
        })?;

        let stem = timestamp.format("%H%M%S%.6f").to_string();
        let path = unique_path(&day_dir, &stem);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_writer(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        self.current = Some(CurrentFile {
            writer: BufWriter::new(file),
            path,
            day: timestamp.date_naive(),
            size: 0,
            checked_at: Instant::now(),
        });
        Ok(())
    }

    /// Flush and close the current file, compressing it if configured.
    fn finish_current(&mut self) -> Result<()> {
        let Some(mut current) = self.current.take() else {
            return Ok(());
        };
        current.writer.flush().map_err(|e| {
            LoggerError::file_writer(
                current.path.display().to_string(),
                format!("Failed to flush before rotation: {}", e),
            )
        })?;
        drop(current.writer);

        if self.config.compress && current.path.exists() {
            if let Err(e) = compress_file(&current.path) {
                eprintln!(
                    "[LOGGER ERROR] Failed to compress {}: {}",
                    current.path.display(),
                    e
                );
            }
        }
        Ok(())
    }
}

impl Writer for FileWriter {
    fn write(&mut self, bytes: &[u8], record: &LogRecord<'_>) -> Result<()> {
        self.check_file(&record.timestamp)?;
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        current.writer.write_all(bytes).map_err(|e| {
            LoggerError::file_writer(current.path.display().to_string(), format!("Write failed: {}", e))
        })?;
        current.size += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(current) = self.current.as_mut() {
            current.writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Some(current) = self.current.as_mut() {
            if let Err(e) = current.writer.flush() {
                eprintln!(
                    "[LOGGER ERROR] Failed to flush {}: {}",
                    current.path.display(),
                    e
                );
            }
        }
    }
}

fn check_config(config: &FileConfig) -> Result<()> {
    if config.max_file_size == 0 {
        return Err(LoggerError::config(
            "FileWriter",
            "max_file_size must be positive",
        ));
    }
    fs::create_dir_all(&config.dir).map_err(|e| {
        LoggerError::io_operation(
            "create log directory",
            format!("Failed to create directory '{}'", config.dir.display()),
            e,
        )
    })
}

/// `<dir>/<stem>.log`, or `<dir>/<stem>-<n>.log` when that name (or its
/// compressed form) is already taken.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let taken = |p: &Path| p.exists() || gz_path(p).exists();
    let path = dir.join(format!("{}.{}", stem, EXTENSION));
    if !taken(&path) {
        return path;
    }
    (1..)
        .map(|n| dir.join(format!("{}-{}.{}", stem, n, EXTENSION)))
        .find(|p| !taken(p))
        .unwrap_or(path)
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` into `path.gz`, then remove the original. The original is only
/// removed once the compressed file is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz = gz_path(path);
    let mut tmp = gz.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let output = File::create(&tmp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", tmp.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let result = io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut out| out.flush())
        .and_then(|_| fs::rename(&tmp, &gz));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER ERROR] Compressed {} but failed to remove it: {}",
            path.display(),
            e
        );
    }
    Ok(())
}
