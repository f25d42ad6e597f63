use thiserror::Error;

#[derive(Error, Debug)]
pub enum BurninError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Expected string or number type for '{position}'. Got: {value} (Make sure you have new burnin presets)")]
    InvalidValueType { position: String, value: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Frame rate error: {0}")]
    FrameRate(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl BurninError {
    pub fn invalid_value<P: Into<String>>(position: P, value: &serde_json::Value) -> Self {
        Self::InvalidValueType {
            position: position.into(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BurninError>;
