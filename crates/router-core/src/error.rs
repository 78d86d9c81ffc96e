use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid recommendation: {0}")]
    InvalidRecommendation(String),

    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("rule already registered: {0}")]
    DuplicateRule(String),

    #[error("invalid decision graph: {0}")]
    InvalidGraph(String),

    #[error("invalid decision path: {0}")]
    InvalidPath(String),

    #[error("user rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
