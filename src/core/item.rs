//! Image item definition and its per-item generation state machine.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::{GeneratedImage, SourceImage};
use crate::utils::StudioError;

/// Stable identifier assigned to an item at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ItemId {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| StudioError::not_found(format!("Invalid item id {s}: {e}")))
    }
}

/// Lifecycle status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Uploaded, never sent to the generator
    Pending,
    /// A generation attempt is in flight
    Processing,
    /// The latest attempt succeeded
    Completed,
    /// The latest attempt failed
    Error,
}

impl ItemStatus {
    /// Whether a bulk "process all" pass should pick this item up
    pub fn is_eligible_for_batch(&self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// How the resolution of one generation attempt was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt was the latest one and moved the item to this status
    Applied(ItemStatus),
    /// A newer attempt was issued meanwhile; the status was left to it
    Superseded,
    /// The item was removed while the attempt was in flight
    Discarded,
}

/// One uploaded photograph and its generation history.
///
/// Fields are private so every status change goes through the transition
/// methods, which keep `error_message` present only in `Error` and never clear
/// a previous result on failure.
#[derive(Debug, Clone)]
pub struct ImageItem {
    id: ItemId,
    source: SourceImage,
    result: Option<GeneratedImage>,
    status: ItemStatus,
    error_message: Option<String>,
    /// Number of the most recently issued attempt
    attempt: u64,
    /// Attempt that produced `result`
    result_attempt: u64,
}

impl ImageItem {
    pub fn new(source: SourceImage) -> Self {
        Self {
            id: ItemId::new(),
            source,
            result: None,
            status: ItemStatus::Pending,
            error_message: None,
            attempt: 0,
            result_attempt: 0,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Completed items with a result are the only ones exported in bulk
    pub fn is_exportable(&self) -> bool {
        self.status == ItemStatus::Completed && self.result.is_some()
    }

    /// Enters `Processing` from any state and returns the new attempt number.
    pub fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.status = ItemStatus::Processing;
        self.error_message = None;
        self.attempt
    }

    /// Records a successful attempt.
    ///
    /// A result is stored unless a newer attempt already stored one; the status
    /// only changes when `attempt` is the latest issued attempt.
    pub fn resolve_success(&mut self, attempt: u64, result: GeneratedImage) -> AttemptOutcome {
        if attempt > self.result_attempt {
            self.result = Some(result);
            self.result_attempt = attempt;
        }

        if attempt != self.attempt {
            return AttemptOutcome::Superseded;
        }

        debug_assert_eq!(self.status, ItemStatus::Processing);
        self.status = ItemStatus::Completed;
        self.error_message = None;
        AttemptOutcome::Applied(self.status)
    }

    /// Records a failed attempt. The previous result, if any, stays in place.
    pub fn resolve_failure(&mut self, attempt: u64, message: impl Into<String>) -> AttemptOutcome {
        if attempt != self.attempt {
            return AttemptOutcome::Superseded;
        }

        debug_assert_eq!(self.status, ItemStatus::Processing);
        self.status = ItemStatus::Error;
        self.error_message = Some(message.into());
        AttemptOutcome::Applied(self.status)
    }
}
