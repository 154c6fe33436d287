//! Eight-entry tag ring and last-reason string exposed to the UI layer
//! (design §7 "user-visible failures").

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

const RING_CAPACITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub unix_time_s: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct TagRing {
    ring: VecDeque<Tag>,
    last_reason: Option<String>,
}

impl TagRing {
    pub fn new() -> Self {
        Self { ring: VecDeque::with_capacity(RING_CAPACITY), last_reason: None }
    }

    pub fn push(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.ring.len() == RING_CAPACITY {
            self.ring.pop_front();
        }
        let unix_time_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.last_reason = Some(reason.clone());
        self.ring.push_back(Tag { unix_time_s, reason });
    }

    pub fn recent(&self) -> &VecDeque<Tag> {
        &self.ring
    }

    pub fn last_reason(&self) -> Option<&str> {
        self.last_reason.as_deref()
    }
}
