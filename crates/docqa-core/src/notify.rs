//! Transient notifications shown over the current screen

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

#[derive(Debug)]
pub struct Notifications {
    notices: VecDeque<Notice>,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            notices: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            message: message.into(),
            raised_at: Instant::now(),
        });
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    /// Drop notices that have been visible longer than the ttl
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.notices
            .retain(|n| now.saturating_duration_since(n.raised_at) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Duration::from_millis(4000))
    }
}
