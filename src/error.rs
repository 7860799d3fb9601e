use thiserror::Error;

/// Errors surfaced by the repository layer.
///
/// Every repository operation resolves to one of these three kinds plus a
/// human-readable message; callers decide whether to display or log them.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A required field was missing from the payload (e.g. an absent id on
    /// update or delete).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The write lost an optimistic-concurrency race: the record vanished
    /// or the submitted version is not newer than the stored one.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The underlying store failed: I/O, constraint violation (e.g. a
    /// duplicate tag name), or a corrupt persisted value.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl RepoError {
    /// Whether this error was caused by caller input rather than the store.
    ///
    /// Validation and conflict failures are resubmittable by the user;
    /// persistence failures are internal. The CLI maps this onto its exit
    /// codes.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Conflict(_))
    }

    pub(crate) fn missing_id() -> Self {
        Self::Validation("missing id".to_string())
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(format!("corrupt record: {err}"))
    }
}

/// Result alias used throughout the repository layer.
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_conflict_are_user_errors() {
        assert!(RepoError::missing_id().is_user_error());
        assert!(RepoError::Conflict("stale version".into()).is_user_error());
        assert!(!RepoError::Persistence("disk full".into()).is_user_error());
    }

    #[test]
    fn messages_carry_the_kind() {
        let err = RepoError::missing_id();
        assert_eq!(err.to_string(), "validation failed: missing id");

        let err = RepoError::Conflict("not found".into());
        assert_eq!(err.to_string(), "conflict: not found");
    }
}
