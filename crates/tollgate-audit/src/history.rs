//! Bounded recent-activity feed for dashboards.
//!
//! `ActivityFeed` implements `NotificationSink` by keeping the most recent
//! notifications in a ring buffer. Older entries fall off the back once the
//! capacity is reached; the durable record is the audit chain, not this.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use tollgate_contracts::{error::GovernanceResult, execution::Notification};
use tollgate_core::traits::NotificationSink;

/// Default number of notifications retained.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct ActivityFeed {
    capacity: usize,
    entries: Arc<Mutex<VecDeque<Notification>>>,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// A feed retaining at most `capacity` notifications (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Up to `limit` notifications, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl NotificationSink for ActivityFeed {
    fn publish(&self, notification: &Notification) -> GovernanceResult<()> {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification.clone());
        Ok(())
    }
}
