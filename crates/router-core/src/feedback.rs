use crate::error::{Result, RouterError};
use crate::recommendation::validate_command;
use crate::types::Complexity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of feedback records kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Feedback / FeedbackRecord
// ---------------------------------------------------------------------------

/// Project signals at the time feedback was given; used to decide whether
/// a later request is similar enough for the feedback to apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackContext {
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub project_complexity: Complexity,
}

/// A user's verdict on a recommendation, as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub user_input: String,
    pub recommended_command: String,
    #[serde(default)]
    pub actual_command: String,
    /// 1 (useless) to 5 (exactly right).
    pub user_rating: u8,
    #[serde(default)]
    pub context: FeedbackContext,
}

impl Feedback {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.user_rating) {
            return Err(RouterError::InvalidRating(self.user_rating));
        }
        validate_command(&self.recommended_command)?;
        if !self.actual_command.is_empty() {
            validate_command(&self.actual_command)?;
        }
        Ok(())
    }

    pub fn is_positive(&self) -> bool {
        self.user_rating >= 4
    }

    pub fn is_negative(&self) -> bool {
        self.user_rating <= 2
    }
}

/// Stored feedback: the submission plus when it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn now(feedback: Feedback) -> Self {
        Self {
            feedback,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackStore
// ---------------------------------------------------------------------------

/// Append-only, bounded feedback history, oldest first.
pub trait FeedbackStore {
    fn append(&mut self, record: FeedbackRecord);

    fn all(&self) -> &[FeedbackRecord];

    /// Replace the whole history, e.g. after loading a saved model.
    fn replace(&mut self, records: Vec<FeedbackRecord>);

    fn len(&self) -> usize {
        self.all().len()
    }

    fn is_empty(&self) -> bool {
        self.all().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryFeedbackStore {
    records: Vec<FeedbackRecord>,
    limit: usize,
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl InMemoryFeedbackStore {
    /// Store keeping at most `limit` records (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn trim(&mut self) {
        if self.records.len() > self.limit {
            let excess = self.records.len() - self.limit;
            self.records.drain(..excess);
        }
    }
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn append(&mut self, record: FeedbackRecord) {
        self.records.push(record);
        self.trim();
    }

    fn all(&self) -> &[FeedbackRecord] {
        &self.records
    }

    fn replace(&mut self, records: Vec<FeedbackRecord>) {
        self.records = records;
        self.trim();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
