mod recorder;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use recorder::{HISTORY_LIMIT, SessionRecorder};
