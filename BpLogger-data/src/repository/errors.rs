use thiserror::Error;

/// Error type for reading store operations.
///
/// A missing local file is not an error: it reads as an empty table.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The local CSV file exists but cannot be read as a reading table
    #[error("Local data file is malformed: {0}")]
    MalformedLocalFile(String),

    /// The local CSV file could not be written
    #[error("Failed to write local data file: {0}")]
    LocalWriteFailure(String),

    /// Remote credentials are absent or invalid, or the token exchange failed
    #[error("Google auth failed: {0}")]
    RemoteAuthFailure(String),

    /// The spreadsheet or worksheet could not be opened or created
    #[error("Opening spreadsheet failed: {0}")]
    RemoteResourceOpenFailure(String),

    /// Reading the worksheet failed
    #[error("Read from Google Sheets failed: {0}")]
    RemoteReadFailure(String),

    /// Clearing or writing the worksheet failed
    #[error("Write to Google Sheets failed: {0}")]
    RemoteWriteFailure(String),

    /// An uploaded file could not be parsed as a reading table
    #[error("Import failed: {0}")]
    ImportParseFailure(String),
}

impl StoreError {
    /// Whether the error came from the remote backend. Remote errors are soft:
    /// callers fall back to the local backend instead of aborting.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StoreError::RemoteAuthFailure(_)
                | StoreError::RemoteResourceOpenFailure(_)
                | StoreError::RemoteReadFailure(_)
                | StoreError::RemoteWriteFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_are_soft() {
        assert!(StoreError::RemoteAuthFailure("no key".into()).is_remote());
        assert!(StoreError::RemoteResourceOpenFailure("404".into()).is_remote());
        assert!(StoreError::RemoteReadFailure("timeout".into()).is_remote());
        assert!(StoreError::RemoteWriteFailure("quota".into()).is_remote());

        assert!(!StoreError::MalformedLocalFile("bad".into()).is_remote());
        assert!(!StoreError::ImportParseFailure("bad".into()).is_remote());
    }

    #[test]
    fn test_error_messages() {
        let err = StoreError::RemoteWriteFailure("quota exceeded".into());
        assert_eq!(err.to_string(), "Write to Google Sheets failed: quota exceeded");
    }
}
