use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrialError {
    /// A command was issued in a state that does not allow it.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Target text generation produced nothing to type.
    #[error("Empty Corpus: target text generation produced no characters")]
    EmptyCorpus,

    #[error("Database Error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

impl TrialError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TrialError::Validation(msg.into())
    }

    /// Errors the user can act on without restarting the application.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TrialError::EmptyCorpus)
    }
}

pub type TrialResult<T> = Result<T, TrialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_corpus_is_fatal() {
        let recoverable = [
            TrialError::validation("no name"),
            TrialError::Database(rusqlite::Error::InvalidQuery),
            TrialError::Io(std::io::Error::other("disk full")),
            TrialError::Json(serde_json::from_str::<u32>("x").unwrap_err()),
            TrialError::Csv(csv::Error::from(std::io::Error::other("closed"))),
        ];
        for e in recoverable {
            assert!(e.is_recoverable(), "{e} should be recoverable");
        }

        assert!(!TrialError::EmptyCorpus.is_recoverable());
    }
}
