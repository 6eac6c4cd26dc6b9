use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cache::{MountEntry, VolumeProbe};

/// Admin operations multiplexed over the job input's `command` field
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Drop the cached model and load it again
    RefreshModel,
    /// Point model caches at a different directory
    SetCacheDir {
        /// New cache directory
        path: PathBuf,
    },
    /// Report volume probe results and visible mounts
    DebugVolumes,
}

/// Input for a normal inference job
#[derive(Debug, Deserialize)]
pub struct InferInput {
    /// Text to synthesize
    #[serde(default)]
    pub text: String,
    /// Sampling temperature; falls back to the worker default
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Top-p sampling value; falls back to the worker default
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Random seed for reproducible outputs
    #[serde(default)]
    pub seed: Option<u64>,
    /// Base64-encoded reference audio for voice cloning
    #[serde(default)]
    pub audio_prompt: Option<String>,
    /// Reload the model before generating
    #[serde(default)]
    pub force_refresh: bool,
}

/// A job input decoded once at the boundary
///
/// Requests carrying a recognized `command` field are admin operations;
/// everything else is an inference request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WorkerRequest {
    /// Admin operation
    Admin(AdminCommand),
    /// Inference request
    Infer(InferInput),
}

/// Result object returned to the provider's queue
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WorkerResponse {
    /// Successful synthesis
    Audio {
        /// Base64-encoded WAV audio
        audio: String,
        /// Audio container format
        format: &'static str,
        /// Sample rate of the audio
        sample_rate: u32,
    },
    /// Admin operation acknowledgement
    Ack {
        /// Human-readable outcome
        status: String,
    },
    /// Volume diagnostics for `debug_volumes`
    Volumes {
        /// Probe results for each candidate cache location
        volumes: Vec<VolumeProbe>,
        /// Mounts visible to the container
        mounts: Vec<MountEntry>,
        /// Cache directory currently in effect
        active_cache_dir: Option<PathBuf>,
    },
    /// Failure reported as a normal result
    Error {
        /// What went wrong
        error: String,
    },
}

impl WorkerResponse {
    /// Build an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { error: message.into() }
    }
}
