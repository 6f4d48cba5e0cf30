//! Typewriter-style reveal of a completed answer
//!
//! Purely presentational: the full text is already known and the reveal
//! only decides how much of it is visible at a given instant.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Reveal {
    text: String,
    total_chars: usize,
    shown_chars: usize,
    visible_end: usize,
    started: Option<Instant>,
    interval: Duration,
}

impl Reveal {
    pub fn new(interval: Duration) -> Self {
        Self {
            text: String::new(),
            total_chars: 0,
            shown_chars: 0,
            visible_end: 0,
            started: None,
            interval,
        }
    }

    /// Replace whatever was revealing with `text`, starting from nothing
    pub fn start(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.total_chars = self.text.chars().count();
        self.shown_chars = 0;
        self.visible_end = 0;
        self.started = Some(now);
    }

    pub fn advance(&mut self, now: Instant) {
        let Some(started) = self.started else {
            return;
        };

        let elapsed = now.saturating_duration_since(started);
        let target = if self.interval.is_zero() {
            self.total_chars
        } else {
            (elapsed.as_nanos() / self.interval.as_nanos()).min(self.total_chars as u128) as usize
        };

        if target != self.shown_chars {
            self.set_shown(target);
        }
        if self.shown_chars == self.total_chars {
            self.started = None;
        }
    }

    /// Jump to the end of the text
    pub fn finish(&mut self) {
        self.set_shown(self.total_chars);
        self.started = None;
    }

    /// Stop revealing and clear the text
    pub fn cancel(&mut self) {
        self.text.clear();
        self.total_chars = 0;
        self.shown_chars = 0;
        self.visible_end = 0;
        self.started = None;
    }

    pub fn visible(&self) -> &str {
        &self.text[..self.visible_end]
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.shown_chars == self.total_chars
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn set_shown(&mut self, chars: usize) {
        self.shown_chars = chars;
        self.visible_end = self
            .text
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
    }
}

impl Default for Reveal {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}
