//! Error types for timetable building.

use thiserror::Error;

/// Errors that can occur while building a personalized timetable.
///
/// Every error is local to the request that produced it; none of them leave
/// state behind in the shared track cache.
#[derive(Error, Debug)]
pub enum EdtError {
    #[error("Missing home track parameter '{0}'")]
    MissingHomeTrack(String),

    #[error("Unknown course unit: {0}")]
    UnknownUnit(String),

    #[error("Invalid group number '{value}' for course unit {unit}")]
    InvalidGroup { unit: String, value: String },

    #[error("Unknown semester: {0}")]
    UnknownSemester(String),

    #[error("No data available for track {track}: {reason}")]
    TrackDataUnavailable { track: String, reason: String },

    #[error("Malformed group pattern: {0}")]
    MalformedPattern(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EdtError {
    /// Whether the error was caused by the caller's input (4xx) rather than
    /// by the service or its data (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EdtError::MissingHomeTrack(_)
                | EdtError::UnknownUnit(_)
                | EdtError::InvalidGroup { .. }
                | EdtError::UnknownSemester(_)
        )
    }
}

/// Result type alias for timetable operations.
pub type EdtResult<T> = Result<T, EdtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_and_server_errors_are_told_apart() {
        assert!(EdtError::MissingHomeTrack("MAJ".into()).is_client_error());
        assert!(EdtError::UnknownUnit("XYZ".into()).is_client_error());
        assert!(
            !EdtError::TrackDataUnavailable {
                track: "DAC".into(),
                reason: "missing".into()
            }
            .is_client_error()
        );
        assert!(!EdtError::MalformedPattern("(".into()).is_client_error());
    }

    #[test]
    fn test_unknown_unit_names_the_code() {
        let err = EdtError::UnknownUnit("FOO".into());
        assert_eq!(err.to_string(), "Unknown course unit: FOO");
    }
}
