//! Import job lifecycle: status machine and progress constants.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress counters are persisted every this many processed rows, and once
/// more at the end of the run.
pub const CHECKPOINT_INTERVAL: usize = 10;

// ---------------------------------------------------------------------------
// Import Job Status
// ---------------------------------------------------------------------------

/// Status of an import job. Transitions only move forward; a terminal
/// status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    Pending,
    Validating,
    Importing,
    Completed,
    Failed,
}

impl ImportJobStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Importing => "importing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "validating" => Some(Self::Validating),
            "importing" => Some(Self::Importing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] =
        &["pending", "validating", "importing", "completed", "failed"];

    /// Whether the job has finished (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the machine admits moving from `self` to `next`. Any active
    /// status may fail; everything else only steps forward.
    pub fn can_transition_to(&self, next: ImportJobStatus) -> bool {
        if next == Self::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Validating)
                | (Self::Pending, Self::Importing)
                | (Self::Validating, Self::Importing)
                | (Self::Importing, Self::Completed)
        )
    }
}

impl std::fmt::Display for ImportJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
