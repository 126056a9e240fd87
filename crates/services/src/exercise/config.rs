use std::time::Duration;

use pecs_core::model::{ActionKind, Difficulty, PhaseId, PracticeSettings};

/// How each round picks its target and the pictures on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStrategy {
    /// A random target among `distractors` random other pictures.
    RandomWithDistractors { distractors: usize },
    /// A target among look-alikes, more of them the harder it gets.
    Discrimination(Difficulty),
    /// Build "I want <picture>" for the first of `images` pictures.
    RequestPhrase { images: usize },
    /// Answer a question about the first of `images` pictures.
    Question { images: usize },
    /// Comment on a scene using a random communicative function.
    Commenting { context: usize, images: usize },
}

/// How an answer is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectnessRule {
    /// The picked picture is the target.
    SameImage,
    /// The spoken sentence equals the expected one, ignoring case and
    /// surrounding whitespace.
    PhraseEquals,
    /// The sentence opens the right way and has at least `min_elements` slots.
    StarterPresent { min_elements: usize },
}

/// How long feedback stays up before the exercise moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub correct: Duration,
    pub retry: Duration,
    pub completion: Duration,
}

impl Pacing {
    const PICTURES: Pacing = Pacing {
        correct: Duration::from_millis(2000),
        retry: Duration::from_millis(1500),
        completion: Duration::from_millis(1000),
    };

    const SENTENCES: Pacing = Pacing {
        correct: Duration::from_millis(3000),
        retry: Duration::from_millis(2000),
        completion: Duration::from_millis(1000),
    };

    /// Every timer fires immediately.
    pub const IMMEDIATE: Pacing = Pacing {
        correct: Duration::ZERO,
        retry: Duration::ZERO,
        completion: Duration::ZERO,
    };
}

/// Everything that distinguishes one phase's exercise from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseConfig {
    pub phase: PhaseId,
    pub target: TargetStrategy,
    pub rule: CorrectnessRule,
    pub action_kind: ActionKind,
    pub mastery_threshold: u32,
    /// Phase 6 accepts any known starter instead of the prompted one.
    pub free_mode: bool,
    pub pacing: Pacing,
}

impl ExerciseConfig {
    /// The standard exercise for `phase`.
    #[must_use]
    pub fn for_phase(phase: PhaseId, settings: &PracticeSettings) -> Self {
        let (target, rule, action_kind, pacing) = match phase.value() {
            1 => (
                TargetStrategy::RandomWithDistractors { distractors: 5 },
                CorrectnessRule::SameImage,
                ActionKind::ImageExchange,
                Pacing::PICTURES,
            ),
            2 => (
                TargetStrategy::RandomWithDistractors { distractors: 4 },
                CorrectnessRule::SameImage,
                ActionKind::ImageExchange,
                Pacing::PICTURES,
            ),
            3 => (
                TargetStrategy::Discrimination(settings.difficulty()),
                CorrectnessRule::SameImage,
                ActionKind::ImageSelect,
                Pacing::PICTURES,
            ),
            4 => (
                TargetStrategy::RequestPhrase { images: 6 },
                CorrectnessRule::PhraseEquals,
                ActionKind::PhraseBuild,
                Pacing::SENTENCES,
            ),
            5 => (
                TargetStrategy::Question { images: 8 },
                CorrectnessRule::PhraseEquals,
                ActionKind::QuestionAnswer,
                Pacing::SENTENCES,
            ),
            _ => (
                TargetStrategy::Commenting {
                    context: 3,
                    images: 12,
                },
                CorrectnessRule::StarterPresent { min_elements: 2 },
                ActionKind::PhraseBuild,
                Pacing::SENTENCES,
            ),
        };

        Self {
            phase,
            target,
            rule,
            action_kind,
            mastery_threshold: settings.mastery_threshold(),
            free_mode: settings.free_mode(),
            pacing: if settings.pacing() {
                pacing
            } else {
                Pacing::IMMEDIATE
            },
        }
    }

    /// Whether answers are picture picks rather than sentence strips.
    #[must_use]
    pub fn expects_image(&self) -> bool {
        matches!(self.rule, CorrectnessRule::SameImage)
    }
}
