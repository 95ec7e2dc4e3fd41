//! Completion status of an execution container.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a session or transaction finished.
///
/// On the wire each status is a single-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionStatus {
    Success,
    Failure,
    PartialSuccess,
    /// Assigned when a container completes without an explicit status.
    Unknown,
}

/// Error returned when a wire string names no completion status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown completion status: {0:?}")]
pub struct ParseStatusError(pub String);

impl CompletionStatus {
    /// All statuses in declaration order.
    pub const ALL: [CompletionStatus; 4] = [
        CompletionStatus::Success,
        CompletionStatus::Failure,
        CompletionStatus::PartialSuccess,
        CompletionStatus::Unknown,
    ];

    /// Returns the single-character wire abbreviation.
    #[must_use]
    pub const fn abbreviation(&self) -> char {
        match self {
            CompletionStatus::Success => 'S',
            CompletionStatus::Failure => 'F',
            CompletionStatus::PartialSuccess => 'P',
            CompletionStatus::Unknown => 'U',
        }
    }

    /// Looks up a status by its abbreviation.
    #[must_use]
    pub fn from_abbreviation(abbrev: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.abbreviation() == abbrev)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for CompletionStatus {
    type Err = ParseStatusError;

    /// Only the first character is significant, so both `"S"` and
    /// `"Success"` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .chars()
            .next()
            .and_then(Self::from_abbreviation)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
