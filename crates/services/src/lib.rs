#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exercise;
pub mod practice;
pub mod progress_store;
mod records;
pub mod sessions;

pub use pecs_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ExerciseError, PracticeError, SessionError};
pub use exercise::{
    AdvanceTicket, Answer, ExerciseConfig, ExerciseEngine, ExerciseState, Feedback, Tick,
};
pub use practice::{PracticeOutcome, PracticeService, PracticeSession, PracticeTick};
pub use progress_store::{PhaseOverview, ProgressStore};
pub use sessions::{HISTORY_LIMIT, SessionRecorder};
