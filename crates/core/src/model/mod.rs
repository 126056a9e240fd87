pub mod catalog;
mod ids;
mod phase;
pub mod phrase;
mod progress;
mod session;
mod settings;

pub use catalog::{Catalog, CatalogImage, ImageCategory, PhaseInfo, PhraseWord};
pub use ids::{ActionId, ImageId, SessionId, UserId};
pub use phase::{PhaseError, PhaseId, PhaseStatus};
pub use phrase::{PhraseElement, phrase_contains, phrases_match, render_phrase};
pub use progress::{ProgressError, ProgressRecord, UserProgress};
pub use session::{
    Action, ActionDraft, ActionKind, Session, SessionError, SessionStats, rounded_percent,
    success_rate,
};
pub use settings::{Difficulty, PracticeSettings, SettingsError};
