use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use pecs_core::model::{Catalog, CatalogImage, Difficulty, ImageId, PhraseWord};

use super::config::{ExerciseConfig, TargetStrategy};
use crate::error::ExerciseError;

//
// ─── PROMPT DATA ───────────────────────────────────────────────────────────────
//

/// Which question phase 5 asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Want,
    See,
    Feel,
    Need,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::Want,
        QuestionKind::See,
        QuestionKind::Feel,
        QuestionKind::Need,
    ];

    /// Catalog id of the starter that answers this question.
    #[must_use]
    pub fn starter_id(self) -> &'static str {
        match self {
            QuestionKind::Want => "want",
            QuestionKind::See => "see",
            QuestionKind::Feel => "feel",
            QuestionKind::Need => "need",
        }
    }

    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            QuestionKind::Want => "What do you want?",
            QuestionKind::See => "What do you see?",
            QuestionKind::Feel => "How do you feel?",
            QuestionKind::Need => "What do you need?",
        }
    }
}

/// A reason to talk in phase 6, with the words a guided answer must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunicativeFunction {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
    pub starter: &'static str,
    pub scenarios: &'static [&'static str],
}

pub const COMMUNICATIVE_FUNCTIONS: &[CommunicativeFunction] = &[
    CommunicativeFunction {
        id: "comment_see",
        name: "Comment on what you see",
        prompt: "Say something about what you see in the picture",
        starter: "I see",
        scenarios: &["In the living room", "At the park", "At home", "At school"],
    },
    CommunicativeFunction {
        id: "comment_hear",
        name: "Comment on what you hear",
        prompt: "Say something about what you hear",
        starter: "I hear",
        scenarios: &["Music playing", "Sounds of nature", "Voices", "Noises"],
    },
    CommunicativeFunction {
        id: "express_feelings",
        name: "Express feelings",
        prompt: "How do you feel about this?",
        starter: "I feel",
        scenarios: &["Happy", "Sad", "Excited", "Calm"],
    },
    CommunicativeFunction {
        id: "share_thoughts",
        name: "Share thoughts",
        prompt: "What do you think about this?",
        starter: "I think",
        scenarios: &["Opinions", "Ideas", "Plans", "Memories"],
    },
    CommunicativeFunction {
        id: "ask_questions",
        name: "Ask questions",
        prompt: "What question would you ask?",
        starter: "What is",
        scenarios: &["Curiosity", "Information", "Help", "Clarification"],
    },
    CommunicativeFunction {
        id: "social_interaction",
        name: "Social interaction",
        prompt: "How would you start a conversation?",
        starter: "I like",
        scenarios: &["Greetings", "Invitations", "Thanks", "Goodbyes"],
    },
];

/// What the learner is asked to do this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Hand over the picture of `target`.
    Exchange { target: ImageId },
    /// Pick `target` out of look-alikes.
    Select { target: ImageId },
    /// Build the request `expected`.
    Request { target: ImageId, expected: String },
    /// Answer `kind` about `target` with `expected`.
    Question {
        kind: QuestionKind,
        target: ImageId,
        expected: String,
    },
    /// Comment on `scenario` using `function`, with `context` as the scene.
    Comment {
        function: CommunicativeFunction,
        scenario: &'static str,
        context: Vec<ImageId>,
    },
}

impl Prompt {
    /// The picture the round is about, if there is a single one.
    #[must_use]
    pub fn target(&self) -> Option<&ImageId> {
        match self {
            Prompt::Exchange { target }
            | Prompt::Select { target }
            | Prompt::Request { target, .. }
            | Prompt::Question { target, .. } => Some(target),
            Prompt::Comment { .. } => None,
        }
    }

    /// The exact sentence a correct answer reads as, when there is one.
    #[must_use]
    pub fn expected_phrase(&self) -> Option<&str> {
        match self {
            Prompt::Request { expected, .. } | Prompt::Question { expected, .. } => {
                Some(expected.as_str())
            }
            _ => None,
        }
    }
}

//
// ─── ROUND ─────────────────────────────────────────────────────────────────────
//

/// One prompt with the pictures and word cards offered for answering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub number: u32,
    pub prompt: Prompt,
    /// Pictures on offer, in display order.
    pub choices: Vec<ImageId>,
    /// Sentence openers on offer; empty for picture phases.
    pub starters: Vec<PhraseWord>,
    /// Joining words on offer; empty for picture phases.
    pub connectors: Vec<PhraseWord>,
    pub presented_at: DateTime<Utc>,
}

impl Round {
    /// Build a fresh round for `config`.
    pub(crate) fn generate(
        config: &ExerciseConfig,
        catalog: &Catalog,
        rng: &mut StdRng,
        number: u32,
        presented_at: DateTime<Utc>,
    ) -> Result<Self, ExerciseError> {
        let images = catalog.images();
        if images.is_empty() {
            return Err(ExerciseError::EmptyCatalog);
        }

        let (prompt, choices, starters) = match config.target {
            TargetStrategy::RandomWithDistractors { distractors } => {
                let target = pick(images, rng);
                let mut choices = vec![target.id.clone()];
                choices.extend(ids(sample(images, distractors, &[&target.id], rng)));
                choices.shuffle(rng);
                (
                    Prompt::Exchange {
                        target: target.id.clone(),
                    },
                    choices,
                    Vec::new(),
                )
            }
            TargetStrategy::Discrimination(difficulty) => {
                let target = pick(images, rng);
                let mut choices = vec![target.id.clone()];
                choices.extend(discrimination_distractors(
                    catalog, target, difficulty, rng,
                ));
                choices.shuffle(rng);
                (
                    Prompt::Select {
                        target: target.id.clone(),
                    },
                    choices,
                    Vec::new(),
                )
            }
            TargetStrategy::RequestPhrase { images: count } => {
                let offered = sample(images, count.max(1), &[], rng);
                let target = offered[0];
                let starter = require_starter(catalog, "want")?;
                (
                    Prompt::Request {
                        target: target.id.clone(),
                        expected: format!("{} {}", starter.text, target.name),
                    },
                    ids(offered),
                    starters_with(catalog, None),
                )
            }
            TargetStrategy::Question { images: count } => {
                let offered = sample(images, count.max(1), &[], rng);
                let target = offered[0];
                let kind = QuestionKind::ALL[rng.random_range(0..QuestionKind::ALL.len())];
                let starter = require_starter(catalog, kind.starter_id())?;
                (
                    Prompt::Question {
                        kind,
                        target: target.id.clone(),
                        expected: format!("{} {}", starter.text, target.name),
                    },
                    ids(offered),
                    starters_with(catalog, None),
                )
            }
            TargetStrategy::Commenting {
                context,
                images: count,
            } => {
                let function =
                    COMMUNICATIVE_FUNCTIONS[rng.random_range(0..COMMUNICATIVE_FUNCTIONS.len())];
                let scenario = function.scenarios[rng.random_range(0..function.scenarios.len())];
                let context = ids(sample(images, context, &[], rng));
                let offered = ids(sample(images, count, &[], rng));
                (
                    Prompt::Comment {
                        function,
                        scenario,
                        context,
                    },
                    offered,
                    starters_with(catalog, Some(function.starter)),
                )
            }
        };

        let connectors = if starters.is_empty() {
            Vec::new()
        } else {
            catalog.connectors().to_vec()
        };

        Ok(Self {
            number,
            prompt,
            choices,
            starters,
            connectors,
            presented_at,
        })
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn pick<'a>(images: &'a [CatalogImage], rng: &mut StdRng) -> &'a CatalogImage {
    &images[rng.random_range(0..images.len())]
}

/// Up to `count` distinct pictures not listed in `exclude`, in random order.
fn sample<'a>(
    images: impl IntoIterator<Item = &'a CatalogImage>,
    count: usize,
    exclude: &[&ImageId],
    rng: &mut StdRng,
) -> Vec<&'a CatalogImage> {
    let mut pool: Vec<&CatalogImage> = images
        .into_iter()
        .filter(|img| !exclude.contains(&&img.id))
        .collect();
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

fn ids(images: Vec<&CatalogImage>) -> Vec<ImageId> {
    images.into_iter().map(|img| img.id.clone()).collect()
}

fn discrimination_distractors(
    catalog: &Catalog,
    target: &CatalogImage,
    difficulty: Difficulty,
    rng: &mut StdRng,
) -> Vec<ImageId> {
    let (similar, others) = match difficulty {
        Difficulty::Easy => return ids(sample(catalog.images(), 2, &[&target.id], rng)),
        Difficulty::Medium => (2, 3),
        Difficulty::Hard => (6, 2),
    };

    let similar = sample(catalog.images_in(target.category), similar, &[&target.id], rng);
    let mut exclude: Vec<&ImageId> = similar.iter().map(|img| &img.id).collect();
    exclude.push(&target.id);
    let others = sample(catalog.images(), others, &exclude, rng);

    ids(similar).into_iter().chain(ids(others)).collect()
}

fn require_starter<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a PhraseWord, ExerciseError> {
    catalog
        .starter(id)
        .ok_or_else(|| ExerciseError::MissingStarter(id.to_string()))
}

/// The catalog's starters, plus `extra` as its own card when missing.
fn starters_with(catalog: &Catalog, extra: Option<&str>) -> Vec<PhraseWord> {
    let mut words: Vec<PhraseWord> = catalog.starters().to_vec();
    if let Some(extra) = extra {
        if !words.iter().any(|w| w.text.eq_ignore_ascii_case(extra)) {
            words.push(PhraseWord {
                id: extra.to_lowercase().replace(' ', "_"),
                text: extra.to_string(),
                symbol: "💬".to_string(),
            });
        }
    }
    words
}
