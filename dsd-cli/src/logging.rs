//! Structured process logger: bridges `log::Record`s (emitted ambiently by
//! `dsd_core`, e.g. rigctl/watchdog/protocol-dispatcher trace lines) and
//! CLI-originated structured events into one of json/logfmt/pretty.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use color_eyre::eyre::{eyre, Result};
use log::{Level, Log, Metadata, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_log_crate(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_target")]
    pub target: LogTarget,
    #[serde(default)]
    pub file_path: Option<std::path::PathBuf>,
    #[serde(default = "default_format")]
    pub format: LogFormat,
    #[serde(default = "default_level")]
    pub level: LogLevel,
}

fn default_target() -> LogTarget {
    LogTarget::Stderr
}
fn default_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            file_path: None,
            format: default_format(),
            level: default_level(),
        }
    }
}

/// Domain-level event shown alongside bridged `log` records, for things a
/// caller wants to emit with structured fields rather than a free-text
/// message (a grant, a tune, an SM state transition).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    Grant { channel_id: u16, target_id: u32, source_id: u32 },
    Tune { freq_hz: u64, backend: &'static str },
    SmTransition { from: String, to: String, reason: String },
    UdpRetune { freq_hz: u64 },
    RdioUpload { talkgroup: u32, dropped: bool },
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Mutex<Box<dyn Write + Send>>,
    start_time: Instant,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| eyre!("log target \"file\" requires a file_path"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };
        Ok(Self { config, writer: Mutex::new(writer), start_time: Instant::now() })
    }

    /// Install as the global `log` facade backend. Ambient `log::info!` etc.
    /// calls from `dsd_core` then flow through this logger's formatter.
    pub fn install(config: LoggingConfig) -> Result<()> {
        let level = config.level.to_log_crate();
        let logger = Self::new(config)?;
        log::set_boxed_logger(Box::new(logger))
            .map_err(|e| eyre!("failed to install logger: {e}"))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn log_event(&self, level: Level, event: &LogEvent) {
        let line = match self.config.format {
            LogFormat::Json => serde_json::json!({
                "ts": Utc::now().to_rfc3339(),
                "level": level.to_string(),
                "event": event,
            })
            .to_string(),
            LogFormat::Logfmt => format!(
                "ts=\"{}\" level={} event={:?}",
                Utc::now().to_rfc3339(),
                level,
                event
            ),
            LogFormat::Pretty => format!(
                "[{}] {:<5} {:?}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                level,
                event
            ),
        };
        self.write_line(&line);
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
            let _ = writer.flush();
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

impl Log for StructuredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.level.to_log_crate()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = match self.config.format {
            LogFormat::Json => serde_json::json!({
                "ts": Utc::now().to_rfc3339(),
                "level": record.level().to_string(),
                "target": record.target(),
                "message": record.args().to_string(),
            })
            .to_string(),
            LogFormat::Logfmt => format!(
                "ts=\"{}\" level={} target={} msg=\"{}\"",
                Utc::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            ),
            LogFormat::Pretty => format!(
                "[{}] {:<5} {}: {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            ),
        };
        self.write_line(&line);
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_event_serialises_tagged_variant() {
        let config = LoggingConfig { format: LogFormat::Json, ..Default::default() };
        let logger = StructuredLogger::new(config).unwrap();
        // Not asserting on stdout content; just confirm it doesn't panic
        // across all three formats.
        logger.log_event(Level::Info, &LogEvent::Tune { freq_hz: 851_000_000, backend: "rigctl" });
    }

    #[test]
    fn level_ordering_matches_log_crate_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Error > LogLevel::Warn);
    }
}
