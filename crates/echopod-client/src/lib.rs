#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Client for submitting text-to-speech jobs to a RunPod serverless endpoint
//!
//! The provider owns the job queue: the client POSTs a job, polls its status
//! until a terminal state, and decodes the base64 WAV payload. There is no
//! retry layer; a transport failure aborts the operation and any running
//! remote job is left to finish on its own.

mod client;
mod error;
mod http_client;
mod streaming;
mod types;

pub use client::{SERVERLESS_API_URL, SpeechOptions, TtsClient};
pub use error::{ClientError, Result};
pub use streaming::{AudioSink, CollectSink, STREAM_CHUNK_SAMPLES};
pub use types::{JobInput, JobOutput, JobRecord, JobStatus};
