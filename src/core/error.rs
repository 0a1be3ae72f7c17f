use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Interpreter error: {0}")]
    Interpreter(String),

    #[error("Malformed interpreter response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AssistError>;
