use thiserror::Error;

use crate::model::{PhaseError, ProgressError, SessionError, SettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PhaseId;

    #[test]
    fn layer_errors_convert_transparently() {
        let err: Error = PhaseId::new(9).unwrap_err().into();
        assert!(matches!(err, Error::Phase(PhaseError::OutOfRange(9))));
        assert_eq!(err.to_string(), PhaseError::OutOfRange(9).to_string());

        let err: Error = SessionError::AlreadyCompleted.into();
        assert_eq!(err.to_string(), "session already completed");
    }
}
