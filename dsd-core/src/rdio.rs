//! Rdio export sidecar: a JSON record alongside each recorded call, pushed
//! through a bounded background upload queue.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

const QUEUE_CAPACITY: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RdioSource {
    pub pos: f64,
    pub src: u32,
}

/// One call's worth of metadata, matching the sidecar JSON a recorder
/// writes next to each WAV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RdioExport {
    pub start_time: i64,
    pub stop_time: i64,
    pub talkgroup: u32,
    pub talkgroup_tag: String,
    #[serde(rename = "srcList")]
    pub src_list: Vec<RdioSource>,
    pub freq: u64,
    pub system: i32,
    pub short_name: String,
    pub emergency: bool,
    pub encrypted: bool,
}

impl RdioExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Bounded producer side of the upload queue: `enqueue` never blocks,
/// dropping the newest job with a warning on overflow rather than stalling
/// the decoder thread.
#[derive(Clone)]
pub struct RdioUploadQueue {
    tx: Sender<RdioExport>,
}

impl RdioUploadQueue {
    /// Build a connected (sender, receiver) pair; the receiver is handed to
    /// the background uploader thread.
    pub fn new() -> (Self, Receiver<RdioExport>) {
        let (tx, rx) = bounded(QUEUE_CAPACITY);
        (Self { tx }, rx)
    }

    /// Enqueue a job, dropping it if the queue is full.
    pub fn enqueue(&self, export: RdioExport) -> bool {
        match self.tx.try_send(export) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("rdio upload queue full ({QUEUE_CAPACITY}), dropping newest job");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("rdio upload queue receiver dropped, discarding job");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_export() -> RdioExport {
        RdioExport {
            start_time: 1000,
            stop_time: 1005,
            talkgroup: 40000,
            talkgroup_tag: "Fire Dispatch".to_string(),
            src_list: vec![RdioSource { pos: 0.0, src: 123456 }],
            freq: 851_012_500,
            system: 1,
            short_name: "demo".to_string(),
            emergency: false,
            encrypted: false,
        }
    }

    #[test]
    fn serializes_with_spec_field_names() {
        let json = sample_export().to_json().unwrap();
        assert!(json.contains("\"srcList\""));
        assert!(json.contains("\"talkgroup\":40000"));
    }

    #[test]
    fn overflow_drops_newest_job() {
        let (queue, rx) = RdioUploadQueue::new();
        for _ in 0..QUEUE_CAPACITY {
            assert!(queue.enqueue(sample_export()));
        }
        assert!(!queue.enqueue(sample_export()));
        assert_eq!(rx.len(), QUEUE_CAPACITY);
    }
}
