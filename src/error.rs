use thiserror::Error;

/// Errors raised while editing, loading or saving a trainer configuration
#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("visible prompts must be between 1 and 10, got {0}")]
    VisiblePrompts(usize),

    #[error("a prompt named '{0}' already exists")]
    DuplicatePrompt(String),

    #[error("no prompt named '{0}'")]
    UnknownPrompt(String),

    #[error("prompt name must not be empty")]
    EmptyName,

    #[error("hotkey for '{0}' has no keys")]
    EmptyHotkey(String),

    #[error("weight must be a non-negative number, got '{0}'")]
    InvalidWeight(String),

    #[error("sequence group '{0}' lists no prompts")]
    EmptySequence(String),

    #[error("invalid sequence format '{0}', expected: group1: prompt1,prompt2;group2: prompt3")]
    SequenceFormat(String),

    #[error("no sequence group at index {0}")]
    UnknownSequence(usize),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
