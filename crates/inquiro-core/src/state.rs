//! UI-agnostic view state types
//!
//! These hold what the feature views show between requests. None of them
//! talk to the network or depend on a UI framework.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A chat message in the question/answer conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Millisecond timestamp, bumped so ids strictly increase within a log.
    pub id: u64,
    pub text: String,
    pub sender: Sender,
}

/// Append-only conversation for one dashboard visit.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    last_id: u64,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: &str) -> u64 {
        self.push(text, Sender::User)
    }

    pub fn push_bot(&mut self, text: &str) -> u64 {
        self.push(text, Sender::Bot)
    }

    /// Inline failure shown in the conversation itself.
    pub fn push_error(&mut self, message: &str) -> u64 {
        self.push(&format!("Error: {}", message), Sender::Bot)
    }

    fn push(&mut self, text: &str, sender: Sender) -> u64 {
        let id = next_id(self.last_id);
        self.last_id = id;
        self.messages.push(ChatMessage {
            id,
            text: text.to_string(),
            sender,
        });
        id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

fn next_id(last: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    now.max(last + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Single transient notification. A new message overwrites the current one.
#[derive(Debug, Clone)]
pub struct Notification {
    pub visible: bool,
    pub message: String,
    pub severity: Severity,
    shown_at: Option<Instant>,
    duration: Duration,
}

impl Notification {
    pub fn new(duration: Duration) -> Self {
        Self {
            visible: false,
            message: String::new(),
            severity: Severity::Info,
            shown_at: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, severity: Severity) {
        self.show_at(message, severity, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.visible = true;
        self.message = message.into();
        self.severity = severity;
        self.shown_at = Some(now);
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
        self.shown_at = None;
    }

    /// Hide the notification once its display time has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(shown_at) = self.shown_at {
            if now.saturating_duration_since(shown_at) >= self.duration {
                self.dismiss();
            }
        }
    }
}
