use std::path::PathBuf;
use std::time::Duration;

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from the TTS job client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Required configuration is missing
    #[error(transparent)]
    Config(#[from] echopod_config::ConfigError),

    /// The request was rejected before submission
    #[error("{0}")]
    InvalidInput(String),

    /// The provider did not return a job id
    #[error("Failed to submit job: {0}")]
    Submission(String),

    /// The job reached a terminal failure state
    #[error("Job {state}: {message}")]
    JobFailed {
        /// Terminal state, lowercased ("failed" or "cancelled")
        state: String,
        /// Provider-reported error text
        message: String,
    },

    /// The job completed without an audio payload
    #[error("no audio data in response")]
    EmptyResult,

    /// Polling exceeded the deadline while the job was still running
    #[error("job timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Network-level failure
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file I/O failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The audio payload was not valid base64
    #[error("failed to decode audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The decoded payload was not a readable WAV stream
    #[error("failed to decode WAV audio: {0}")]
    Audio(#[from] hound::Error),

    /// The local playback task failed
    #[error("audio playback task failed: {0}")]
    Playback(String),
}
