//! In-memory chat transcript for one user/bot pair.
//!
//! The transcript only ever changes in three ways: it is set wholesale when
//! history loads or is cleared, it grows by appending at the tail when a
//! message is sent, and a pending entry is reconciled in place once the
//! backend answers. Entries are keyed by a locally generated id because the
//! backend reply carries no identifier of its own.

use chrono::{DateTime, Utc};

use crate::api::ChatRecord;

/// User-facing text shown in place of a reply when the send itself failed.
pub const SEND_ERROR_REPLY: &str =
    "Sorry, there was an error processing your message. Please try again.";

/// Backend apology used when a reply arrives without a response field.
pub const MISSING_REPLY: &str =
    "I apologize, but I'm having trouble processing your request.";

/// Delivery state of the bot's side of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Sent to the backend, no answer yet. Rendered as an animated indicator.
    Pending,
    /// The backend's reply text (or a synthesized greeting).
    Received(String),
    /// The send failed; holds the user-facing error text.
    Failed(String),
}

impl Reply {
    pub fn is_pending(&self) -> bool {
        matches!(self, Reply::Pending)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Pending => None,
            Reply::Received(text) | Reply::Failed(text) => Some(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: u64,
    /// The user's text. Empty for synthesized greeting entries.
    pub message: String,
    pub reply: Reply,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|entry| entry.reply.is_pending())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace the transcript with fetched history, in arrival order. An
    /// empty history synthesizes a single greeting entry instead.
    pub fn load(&mut self, records: Vec<ChatRecord>, greeting: &str) {
        self.entries.clear();
        if records.is_empty() {
            self.greet(greeting);
            return;
        }
        for record in records {
            let id = self.allocate_id();
            self.entries.push(TranscriptEntry {
                id,
                message: record.message,
                reply: Reply::Received(record.response),
                timestamp: record.timestamp.unwrap_or_else(Utc::now),
            });
        }
    }

    /// Append a greeting entry with no user side. Used both for empty
    /// histories and as the fallback when the history fetch fails.
    pub fn greet(&mut self, greeting: &str) {
        let id = self.allocate_id();
        self.entries.push(TranscriptEntry {
            id,
            message: String::new(),
            reply: Reply::Received(greeting.to_string()),
            timestamp: Utc::now(),
        });
    }

    /// Append a pending exchange for a just-sent message and return the local
    /// id the eventual reply reconciles against.
    pub fn begin_send(&mut self, message: String) -> u64 {
        let id = self.allocate_id();
        self.entries.push(TranscriptEntry {
            id,
            message,
            reply: Reply::Pending,
            timestamp: Utc::now(),
        });
        id
    }

    /// Reconcile a pending entry with the backend's reply text. Returns false
    /// when the entry no longer exists (e.g. history was cleared mid-flight).
    pub fn resolve(&mut self, id: u64, text: String) -> bool {
        self.reconcile(id, Reply::Received(text))
    }

    /// Mark a pending entry as failed with user-facing error text.
    pub fn fail(&mut self, id: u64, text: String) -> bool {
        self.reconcile(id, Reply::Failed(text))
    }

    fn reconcile(&mut self, id: u64, reply: Reply) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.reply = reply;
                entry.timestamp = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drop every entry. Only called after the backend confirmed deletion.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
