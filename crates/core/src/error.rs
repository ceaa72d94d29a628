use thiserror::Error;

pub type RotationResult<T> = Result<T, RotationError>;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No such rotation: {0}")]
    NoSuchRotation(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("No candidate rotations to choose from")]
    NoCandidates,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RotationError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::NoSuchRotation(_) => "no_such_rotation",
            Self::AlreadyExists(_) => "already_exists",
            Self::NoCandidates => "no_candidates",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// True for lookups or updates that touched zero rows.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NoSuchRotation(_))
    }
}

impl From<config::ConfigError> for RotationError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(RotationError::NotFound("banner".into()).is_not_found());
        assert!(RotationError::NoSuchRotation("key".into()).is_not_found());
        assert!(!RotationError::NoCandidates.is_not_found());
        assert!(!RotationError::StoreUnavailable("down".into()).is_not_found());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            RotationError::Validation(String::new()),
            RotationError::NotFound(String::new()),
            RotationError::NoSuchRotation(String::new()),
            RotationError::AlreadyExists(String::new()),
            RotationError::NoCandidates,
            RotationError::StoreUnavailable(String::new()),
            RotationError::Config(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
