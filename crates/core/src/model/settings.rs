use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("unknown difficulty: {0} (expected easy, medium or hard)")]
    UnknownDifficulty(String),

    #[error("mastery threshold must be > 0")]
    InvalidMasteryThreshold,
}

/// How hard picture discrimination is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Three pictures from unrelated categories.
    #[default]
    Easy,
    /// Six pictures, some from the target's category.
    Medium,
    /// Up to nine pictures, mostly from the target's category.
    Hard,
}

impl FromStr for Difficulty {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(SettingsError::UnknownDifficulty(other.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

/// Learner-facing knobs for practice sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSettings {
    difficulty: Difficulty,
    free_mode: bool,
    pacing: bool,
    mastery_threshold: u32,
}

impl PracticeSettings {
    pub const DEFAULT_MASTERY_THRESHOLD: u32 = 3;

    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMasteryThreshold` if the threshold is 0.
    pub fn new(
        difficulty: Difficulty,
        free_mode: bool,
        pacing: bool,
        mastery_threshold: u32,
    ) -> Result<Self, SettingsError> {
        if mastery_threshold == 0 {
            return Err(SettingsError::InvalidMasteryThreshold);
        }
        Ok(Self {
            difficulty,
            free_mode,
            pacing,
            mastery_threshold,
        })
    }

    /// Discrimination difficulty for phase 3.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Phase 6 accepts any sentence that opens with a known starter.
    #[must_use]
    pub fn free_mode(&self) -> bool {
        self.free_mode
    }

    /// Whether feedback stays on screen for a pause before the next round.
    #[must_use]
    pub fn pacing(&self) -> bool {
        self.pacing
    }

    /// Correct answers needed to master a phase.
    #[must_use]
    pub fn mastery_threshold(&self) -> u32 {
        self.mastery_threshold
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_free_mode(mut self, free_mode: bool) -> Self {
        self.free_mode = free_mode;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: bool) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            free_mode: false,
            pacing: true,
            mastery_threshold: Self::DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_difficulty_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!(matches!(
            "brutal".parse::<Difficulty>(),
            Err(SettingsError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        assert_eq!(
            PracticeSettings::new(Difficulty::Easy, false, true, 0),
            Err(SettingsError::InvalidMasteryThreshold)
        );
    }

    #[test]
    fn defaults_require_three_correct() {
        let settings = PracticeSettings::default();
        assert_eq!(settings.mastery_threshold(), 3);
        assert!(settings.pacing());
        assert!(!settings.free_mode());
    }
}
