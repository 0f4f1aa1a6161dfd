// src/logging.rs
// Simple logging utility. The terminal front ends own stdout, so lines go to
// a log file once one is opened and to stderr before that.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Log level enum
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
    Warning,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
        }
    }
}

/// Append log lines to `path` from now on.
pub fn init_log_file<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = Some(file);
    }
    Ok(())
}

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("{} - {} - {}", timestamp, level.as_str(), message)
}

/// Format and write a log message with timestamp
pub fn log_message(level: LogLevel, message: &str) {
    let line = format_line(level, message);
    if let Ok(mut log_file) = LOG_FILE.lock() {
        if let Some(file) = log_file.as_mut() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
            return;
        }
    }
    eprintln!("{line}");
}

/// Log a debug message (only when verbose)
pub fn log_debug(message: &str) {
    if is_verbose() {
        log_message(LogLevel::Debug, message);
    }
}

/// Log an info message
pub fn log_info(message: &str) {
    log_message(LogLevel::Info, message);
}

/// Log an error message
pub fn log_error(message: &str) {
    log_message(LogLevel::Error, message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    log_message(LogLevel::Warning, message);
}
