use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhaseError {
    #[error("phase must be between 1 and 6, got {0}")]
    OutOfRange(u8),
}

/// One of the six curriculum phases, always in `1..=6`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PhaseId(u8);

impl PhaseId {
    pub const FIRST: PhaseId = PhaseId(1);
    pub const LAST: PhaseId = PhaseId(6);

    /// Creates a `PhaseId`.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::OutOfRange` if `value` is not in `1..=6`.
    pub fn new(value: u8) -> Result<Self, PhaseError> {
        if (Self::FIRST.0..=Self::LAST.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PhaseError::OutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// The following phase, or `None` after the last one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    /// All phases in curriculum order.
    pub fn all() -> impl Iterator<Item = PhaseId> {
        (Self::FIRST.0..=Self::LAST.0).map(PhaseId)
    }
}

impl TryFrom<u8> for PhaseId {
    type Error = PhaseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhaseId> for u8 {
    fn from(phase: PhaseId) -> Self {
        phase.0
    }
}

impl fmt::Debug for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhaseId({})", self.0)
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a phase is presented on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Mastered at least once.
    Completed,
    /// The highest unlocked phase.
    Current,
    /// Unlocked but neither current nor completed.
    Available,
    Locked,
}

impl PhaseStatus {
    #[must_use]
    pub fn is_playable(self) -> bool {
        !matches!(self, PhaseStatus::Locked)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PhaseStatus::Completed => "completed",
            PhaseStatus::Current => "current",
            PhaseStatus::Available => "available",
            PhaseStatus::Locked => "locked",
        }
    }
}
