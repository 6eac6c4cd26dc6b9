/// Management client result type
pub type Result<T> = std::result::Result<T, RunpodError>;

/// Errors from the RunPod management APIs
#[derive(Debug, thiserror::Error)]
pub enum RunpodError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request
    #[error("RunPod API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// A GraphQL mutation returned errors
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// A required field was missing from an otherwise successful response
    #[error("response missing expected field `{0}`")]
    MissingField(&'static str),

    /// A response body could not be decoded into the expected shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
