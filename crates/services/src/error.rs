//! Shared error types for the services crate.

use thiserror::Error;

use pecs_core::model::PhaseId;
use storage::sqlite::SqliteInitError;

pub use pecs_core::model::SessionError;

/// Errors emitted by the exercise engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("catalog has no pictures to practice with")]
    EmptyCatalog,
    #[error("catalog is missing the sentence starter `{0}`")]
    MissingStarter(String),
    #[error("cannot accept an answer while {state}")]
    NotPresenting { state: &'static str },
    #[error("this exercise expects a {expected} answer")]
    AnswerShape { expected: &'static str },
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("phase {0} is locked")]
    PhaseLocked(PhaseId),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
