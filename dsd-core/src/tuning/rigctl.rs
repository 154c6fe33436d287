//! rigctl TCP client: `F <hz>`, `M <mode> <bw>`, `f`, `l`, `l SQL`,
//! `L SQL <dB>`, with a bounded receive timeout and last-command caching.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::errors::{Result, TuningError};

/// Modulation fallback order when setting mode: NFM first, then FM.
const MODE_CANDIDATES: [&str; 2] = ["NFM", "FM"];

pub struct RigctlClient {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<TcpStream>,
    last_freq_hz: Option<u64>,
    last_bw_hz: Option<u32>,
}

impl RigctlClient {
    pub fn new(host: impl Into<String>, port: u16, timeout_ms: u64) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_millis(timeout_ms),
            stream: None,
            last_freq_hz: None,
            last_bw_hz: None,
        }
    }

    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(|e| {
            TuningError::RigctlConnect { reason: e.to_string() }
        })?;
        stream.set_read_timeout(Some(self.timeout)).map_err(|e| TuningError::RigctlConnect {
            reason: e.to_string(),
        })?;
        stream.set_write_timeout(Some(self.timeout)).map_err(|e| TuningError::RigctlConnect {
            reason: e.to_string(),
        })?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Send a command line and read one response line, reconnecting once on
    /// a broken pipe. A read timeout maps to `TuningError::RigctlTimeout`.
    fn command(&mut self, line: &str) -> Result<String> {
        self.connect()?;
        let stream = self.stream.as_mut().expect("connected above");
        if stream.write_all(format!("{line}\n").as_bytes()).is_err() {
            self.stream = None;
            self.connect()?;
            self.stream
                .as_mut()
                .expect("connected above")
                .write_all(format!("{line}\n").as_bytes())
                .map_err(|e| TuningError::RigctlConnect { reason: e.to_string() })?;
        }
        let stream = self.stream.as_mut().expect("connected above");
        let mut reader = BufReader::new(stream.try_clone().map_err(|e| TuningError::RigctlConnect {
            reason: e.to_string(),
        })?);
        let mut response = String::new();
        match reader.read_line(&mut response) {
            Ok(0) => {
                self.stream = None;
                Err(TuningError::RigctlConnect { reason: "connection closed".to_string() }.into())
            }
            Ok(_) => {
                if let Some(rest) = response.trim().strip_prefix("RPRT ") {
                    let code: i32 = rest.trim().parse().unwrap_or(-1);
                    if code != 0 {
                        return Err(TuningError::RigctlError { code }.into());
                    }
                }
                Ok(response.trim_end().to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                Err(TuningError::RigctlTimeout { millis: self.timeout.as_millis() as u64 }.into())
            }
            Err(e) => {
                self.stream = None;
                Err(TuningError::RigctlConnect { reason: e.to_string() }.into())
            }
        }
    }

    /// `F <hz>`, skipped if it matches the cached last frequency.
    pub fn set_freq(&mut self, freq_hz: u64) -> Result<()> {
        if self.last_freq_hz == Some(freq_hz) {
            return Ok(());
        }
        self.command(&format!("F {freq_hz}"))?;
        self.last_freq_hz = Some(freq_hz);
        Ok(())
    }

    /// `M <mode> <bw>`, trying NFM then falling back to FM on an `RPRT`
    /// error, skipped if it matches the cached last bandwidth and mode
    /// already applied.
    pub fn set_mode(&mut self, bw_hz: u32) -> Result<()> {
        if self.last_bw_hz == Some(bw_hz) {
            return Ok(());
        }
        let mut last_err = None;
        for mode in MODE_CANDIDATES {
            match self.command(&format!("M {mode} {bw_hz}")) {
                Ok(_) => {
                    self.last_bw_hz = Some(bw_hz);
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.expect("MODE_CANDIDATES is non-empty"))
    }

    /// `f`: query current frequency.
    pub fn get_freq(&mut self) -> Result<u64> {
        let line = self.command("f")?;
        line.trim()
            .parse()
            .map_err(|_| TuningError::RigctlError { code: -1 }.into())
    }

    /// `l`: query current squelch level.
    pub fn get_squelch(&mut self) -> Result<f64> {
        let line = self.command("l")?;
        line.trim()
            .parse()
            .map_err(|_| TuningError::RigctlError { code: -1 }.into())
    }

    /// `l SQL`: query the squelch level explicitly by name.
    pub fn get_squelch_named(&mut self) -> Result<f64> {
        let line = self.command("l SQL")?;
        line.trim()
            .parse()
            .map_err(|_| TuningError::RigctlError { code: -1 }.into())
    }

    /// `L SQL <dB>`: set squelch level.
    pub fn set_squelch(&mut self, db: f64) -> Result<()> {
        self.command(&format!("L SQL {db}"))?;
        Ok(())
    }

    pub fn cached_freq_hz(&self) -> Option<u64> {
        self.last_freq_hz
    }
}
