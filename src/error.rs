//! Error types for the analyzer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An external collaborator (tagger, polarity scorer, keyword ranker)
    /// failed on one input.
    #[error("{service} failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// Nothing to analyze or report.
    #[error("no data: {0}")]
    NoData(String),
}

impl Error {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Error::Service {
            service,
            message: message.into(),
        }
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Error::NoData(msg.into())
    }
}
