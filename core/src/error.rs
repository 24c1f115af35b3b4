use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("Invalid month '{value}': expected YYYY-MM")]
    InvalidMonth { value: String },

    #[error("No latest activity for account '{account_id}', user '{user_id}'")]
    MissingLatestActivity { account_id: String, user_id: String },

    #[error("Account '{account_id}' retained no baseline users; ratio is undefined")]
    ZeroBaseline { account_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
