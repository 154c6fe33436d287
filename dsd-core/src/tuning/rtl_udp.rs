//! RTL-SDR UDP tuner: 5-byte `[0x00, f0..f3]` little-endian frequency frame.

use std::net::UdpSocket;

use crate::errors::{Result, TuningError};

pub struct RtlUdpTuner {
    socket: UdpSocket,
    target: String,
    last_freq_hz: Option<u64>,
}

impl RtlUdpTuner {
    pub fn new(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| TuningError::RtlUdpSend { reason: e.to_string() })?;
        Ok(Self { socket, target: format!("127.0.0.1:{port}"), last_freq_hz: None })
    }

    /// Build the 5-byte tune frame for `freq_hz`: `0x00` followed by the
    /// little-endian `u32` frequency. Truncates to the low 32 bits if the
    /// frequency doesn't fit (it always should for RF tuning ranges).
    pub fn frame(freq_hz: u64) -> [u8; 5] {
        let freq32 = freq_hz as u32;
        let bytes = freq32.to_le_bytes();
        [0x00, bytes[0], bytes[1], bytes[2], bytes[3]]
    }

    pub fn set_freq(&mut self, freq_hz: u64) -> Result<()> {
        if self.last_freq_hz == Some(freq_hz) {
            return Ok(());
        }
        let frame = Self::frame(freq_hz);
        self.socket
            .send_to(&frame, &self.target)
            .map_err(|e| TuningError::RtlUdpSend { reason: e.to_string() })?;
        self.last_freq_hz = Some(freq_hz);
        Ok(())
    }

    pub fn cached_freq_hz(&self) -> Option<u64> {
        self.last_freq_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_matches_wire_format() {
        let frame = RtlUdpTuner::frame(851_012_500);
        assert_eq!(frame[0], 0x00);
        let freq = u32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
        assert_eq!(freq, 851_012_500);
    }
}
