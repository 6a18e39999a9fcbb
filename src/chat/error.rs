use thiserror::Error;

/// Every way a chat operation can fail
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Rate limit exceeded. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The model call failed or timed out. The upstream message is
    /// passed through as is.
    #[error("{0}")]
    Upstream(String),

    #[error("{context}")]
    Persistence {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ChatError {
    pub fn validation(msg: &str) -> Self {
        ChatError::Validation(msg.to_string())
    }

    /// Returns a closure for use with `map_err` that wraps a store
    /// error with a description of what was being done.
    pub fn persistence(context: &str) -> impl FnOnce(anyhow::Error) -> Self + '_ {
        move |source| ChatError::Persistence {
            context: context.to_string(),
            source,
        }
    }
}
