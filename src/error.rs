use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("another run holds the lock on {0}")]
    Locked(PathBuf),
    #[error("output history already exists: {0}")]
    HistoryExists(PathBuf),
    #[error("archive entry listed but not extracted: {0}")]
    MissingExtractedFile(PathBuf),
    #[error("archive unreadable or corrupt: {path}: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },
    #[error("`git {command}` failed in {repo}: {stderr}")]
    VcsCommandFailed {
        command: String,
        repo: PathBuf,
        stderr: String,
    },
    #[error("two archives share key `{key}` with different content: {first} and {second}")]
    ArchiveKeyCollision {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("no version label for archive `{0}`")]
    UnknownVersion(String),
    #[error("config invalid or unreadable: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryErrorCode {
    E001Locked,
    E002HistoryExists,
    E003CorruptArchive,
    E004MissingExtract,
    E005KeyCollision,
    E006VcsFailed,
}

impl HistoryErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001Locked => "E001_LOCKED",
            Self::E002HistoryExists => "E002_HISTORY_EXISTS",
            Self::E003CorruptArchive => "E003_CORRUPT_ARCHIVE",
            Self::E004MissingExtract => "E004_MISSING_EXTRACT",
            Self::E005KeyCollision => "E005_KEY_COLLISION",
            Self::E006VcsFailed => "E006_VCS_FAILED",
        }
    }

    pub fn for_error(err: &anyhow::Error) -> Option<Self> {
        let history = err.downcast_ref::<HistoryError>()?;
        Some(match history {
            HistoryError::Locked(_) => Self::E001Locked,
            HistoryError::HistoryExists(_) => Self::E002HistoryExists,
            HistoryError::CorruptArchive { .. } => Self::E003CorruptArchive,
            HistoryError::MissingExtractedFile(_) => Self::E004MissingExtract,
            HistoryError::ArchiveKeyCollision { .. } => Self::E005KeyCollision,
            HistoryError::VcsCommandFailed { .. } => Self::E006VcsFailed,
            HistoryError::UnknownVersion(_) | HistoryError::InvalidConfig(_) => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryError, HistoryErrorCode};
    use std::path::PathBuf;

    #[test]
    fn error_code_follows_typed_error_through_context() {
        let err = anyhow::Error::new(HistoryError::HistoryExists(PathBuf::from("out")))
            .context("initialising demo history");
        assert_eq!(
            HistoryErrorCode::for_error(&err),
            Some(HistoryErrorCode::E002HistoryExists)
        );
    }

    #[test]
    fn untyped_errors_have_no_code() {
        let err = anyhow::anyhow!("plain failure");
        assert_eq!(HistoryErrorCode::for_error(&err), None);
    }
}
