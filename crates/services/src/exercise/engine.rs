use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pecs_core::model::{
    ActionDraft, ActionKind, Catalog, ImageId, PhraseElement, phrase_contains, phrases_match,
    render_phrase, rounded_percent,
};
use pecs_core::time::non_negative;

use super::config::{CorrectnessRule, ExerciseConfig};
use super::round::{Prompt, Round};
use crate::error::ExerciseError;

//
// ─── PUBLIC TYPES ──────────────────────────────────────────────────────────────
//

/// A learner's response to the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Image(ImageId),
    Phrase(Vec<PhraseElement>),
}

impl Answer {
    /// The picture this answer is about, if any.
    #[must_use]
    pub fn image_id(&self) -> Option<&ImageId> {
        match self {
            Answer::Image(id) => Some(id),
            Answer::Phrase(elements) => elements.iter().find_map(|el| match el {
                PhraseElement::Image(id) => Some(id),
                PhraseElement::Text(_) => None,
            }),
        }
    }
}

/// What happens once feedback has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    NewRound,
    Retry,
    CompletionPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseState {
    Presenting,
    Evaluating { correct: bool },
    Advancing { next: Next },
    Completed,
    Closed,
}

impl ExerciseState {
    fn label(self) -> &'static str {
        match self {
            ExerciseState::Presenting => "presenting",
            ExerciseState::Evaluating { .. } => "showing feedback",
            ExerciseState::Advancing { .. } => "advancing",
            ExerciseState::Completed => "completed",
            ExerciseState::Closed => "closed",
        }
    }
}

/// Permission to move the exercise on after `delay`.
///
/// Only the most recently issued ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    generation: u64,
    pub delay: StdDuration,
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub score: u32,
    pub attempts: u32,
    pub mastered: bool,
    pub response_time: Duration,
    pub kind: ActionKind,
    pub image_id: Option<ImageId>,
    pub ticket: AdvanceTicket,
}

impl Feedback {
    /// The attempt as it should be logged in the session.
    #[must_use]
    pub fn action_draft(&self) -> ActionDraft {
        let draft = ActionDraft::new(self.kind, self.correct, self.response_time);
        match &self.image_id {
            Some(id) => draft.with_image(id.clone()),
            None => draft,
        }
    }
}

/// Result of a timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The ticket was superseded or the exercise is over; nothing changed.
    Stale,
    /// Feedback is done; wait again before the next step.
    Advancing(AdvanceTicket),
    /// A round is on screen, either new or retried.
    Presenting,
    /// Mastery reached; the exercise is finished.
    Completed,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Runs one phase's exercise: presents rounds, judges answers and tracks
/// local score until mastery.
pub struct ExerciseEngine {
    config: ExerciseConfig,
    catalog: Arc<Catalog>,
    rng: StdRng,
    state: ExerciseState,
    round: Round,
    score: u32,
    attempts: u32,
    generation: u64,
}

impl ExerciseEngine {
    /// Start an exercise with the first round presented at `at`.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the catalog cannot supply a round.
    pub fn new(
        config: ExerciseConfig,
        catalog: Arc<Catalog>,
        at: DateTime<Utc>,
    ) -> Result<Self, ExerciseError> {
        Self::with_seed(config, catalog, rand::rng().random(), at)
    }

    /// Like `new`, with reproducible rounds.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the catalog cannot supply a round.
    pub fn with_seed(
        config: ExerciseConfig,
        catalog: Arc<Catalog>,
        seed: u64,
        at: DateTime<Utc>,
    ) -> Result<Self, ExerciseError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = Round::generate(&config, &catalog, &mut rng, 1, at)?;
        Ok(Self {
            config,
            catalog,
            rng,
            state: ExerciseState::Presenting,
            round,
            score: 0,
            attempts: 0,
            generation: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn state(&self) -> ExerciseState {
        self.state
    }

    #[must_use]
    pub fn round(&self) -> &Round {
        &self.round
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn mastered(&self) -> bool {
        self.score >= self.config.mastery_threshold
    }

    /// Rounded percentage of correct answers so far.
    #[must_use]
    pub fn success_rate(&self) -> u32 {
        rounded_percent(self.score, self.attempts)
    }

    /// Judge `answer` against the round on screen.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::NotPresenting` outside `Presenting` and
    /// `ExerciseError::AnswerShape` if the answer kind does not fit the phase.
    pub fn submit(&mut self, answer: &Answer, at: DateTime<Utc>) -> Result<Feedback, ExerciseError> {
        if self.state != ExerciseState::Presenting {
            return Err(ExerciseError::NotPresenting {
                state: self.state.label(),
            });
        }

        let correct = self.judge(answer)?;
        self.attempts = self.attempts.saturating_add(1);
        if correct {
            self.score = self.score.saturating_add(1);
        }
        self.state = ExerciseState::Evaluating { correct };

        let delay = if correct {
            self.config.pacing.correct
        } else {
            self.config.pacing.retry
        };

        Ok(Feedback {
            correct,
            score: self.score,
            attempts: self.attempts,
            mastered: self.mastered(),
            response_time: non_negative(at - self.round.presented_at),
            kind: self.config.action_kind,
            image_id: answer.image_id().cloned(),
            ticket: self.issue(delay),
        })
    }

    /// A timer for `ticket` fired at `at`.
    pub fn tick(&mut self, ticket: AdvanceTicket, at: DateTime<Utc>) -> Tick {
        if ticket.generation != self.generation {
            return Tick::Stale;
        }

        match self.state {
            ExerciseState::Evaluating { correct } => {
                let next = match (correct, self.mastered()) {
                    (false, _) => Next::Retry,
                    (true, true) => Next::CompletionPrompt,
                    (true, false) => Next::NewRound,
                };
                let delay = match next {
                    Next::CompletionPrompt => self.config.pacing.completion,
                    Next::NewRound | Next::Retry => StdDuration::ZERO,
                };
                self.state = ExerciseState::Advancing { next };
                Tick::Advancing(self.issue(delay))
            }
            ExerciseState::Advancing { next } => match next {
                Next::CompletionPrompt => {
                    self.state = ExerciseState::Completed;
                    self.generation += 1;
                    Tick::Completed
                }
                Next::Retry => {
                    self.round.presented_at = at;
                    self.state = ExerciseState::Presenting;
                    self.generation += 1;
                    Tick::Presenting
                }
                Next::NewRound => self.next_round(at),
            },
            ExerciseState::Presenting | ExerciseState::Completed | ExerciseState::Closed => {
                Tick::Stale
            }
        }
    }

    /// The exercise is no longer shown; outstanding tickets become stale.
    pub fn close(&mut self) {
        self.state = ExerciseState::Closed;
        self.generation += 1;
    }

    fn issue(&mut self, delay: StdDuration) -> AdvanceTicket {
        self.generation += 1;
        AdvanceTicket {
            generation: self.generation,
            delay,
        }
    }

    fn next_round(&mut self, at: DateTime<Utc>) -> Tick {
        let number = self.round.number.saturating_add(1);
        match Round::generate(&self.config, &self.catalog, &mut self.rng, number, at) {
            Ok(round) => self.round = round,
            // The catalog produced the first round, so this only happens if it
            // cannot; repeat the current round instead of stalling.
            Err(err) => {
                tracing::warn!(error = %err, "could not build next round, repeating");
                self.round.presented_at = at;
            }
        }
        self.state = ExerciseState::Presenting;
        self.generation += 1;
        Tick::Presenting
    }

    fn judge(&self, answer: &Answer) -> Result<bool, ExerciseError> {
        match (self.config.rule, answer) {
            (CorrectnessRule::SameImage, Answer::Image(id)) => {
                Ok(self.round.prompt.target() == Some(id))
            }
            (CorrectnessRule::SameImage, Answer::Phrase(_)) => {
                Err(ExerciseError::AnswerShape { expected: "picture" })
            }
            (_, Answer::Image(_)) => Err(ExerciseError::AnswerShape {
                expected: "sentence",
            }),
            (CorrectnessRule::PhraseEquals, Answer::Phrase(elements)) => {
                let spoken = render_phrase(elements, &self.catalog);
                Ok(self
                    .round
                    .prompt
                    .expected_phrase()
                    .is_some_and(|expected| phrases_match(&spoken, expected)))
            }
            (CorrectnessRule::StarterPresent { min_elements }, Answer::Phrase(elements)) => {
                if elements.len() < min_elements {
                    return Ok(false);
                }
                if self.config.free_mode {
                    return Ok(elements.iter().any(|el| match el {
                        PhraseElement::Text(text) => self
                            .round
                            .starters
                            .iter()
                            .any(|w| phrases_match(text, &w.text)),
                        PhraseElement::Image(_) => false,
                    }));
                }
                let Prompt::Comment { function, .. } = &self.round.prompt else {
                    return Ok(false);
                };
                let spoken = render_phrase(elements, &self.catalog);
                Ok(phrase_contains(&spoken, function.starter))
            }
        }
    }
}
