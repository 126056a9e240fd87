//! Per-phase exercise engine.
//!
//! All six phases share one state machine; `ExerciseConfig` decides how a
//! round is built and how an answer is judged. Timers belong to the caller:
//! each answer yields an `AdvanceTicket` to hand back to `tick` after its
//! delay, and superseded tickets are ignored.

mod config;
mod engine;
mod round;

pub use config::{CorrectnessRule, ExerciseConfig, Pacing, TargetStrategy};
pub use engine::{AdvanceTicket, Answer, ExerciseEngine, ExerciseState, Feedback, Next, Tick};
pub use round::{COMMUNICATIVE_FUNCTIONS, CommunicativeFunction, Prompt, QuestionKind, Round};
