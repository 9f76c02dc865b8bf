use devpulse_core::EnrollError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for EnrollError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => EnrollError::NotFound(what),
            other => EnrollError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_enroll_not_found() {
        let err: EnrollError = StoreError::NotFound("invite inv_1".into()).into();
        assert_eq!(err, EnrollError::NotFound("invite inv_1".into()));
        assert!(err.is_not_found());
    }

    #[test]
    fn database_maps_to_enroll_store() {
        let err: EnrollError = StoreError::Database("locked".into()).into();
        assert!(matches!(err, EnrollError::Store(_)));
    }
}
