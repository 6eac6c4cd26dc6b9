#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Worker-side request handler for the TTS serverless endpoint
//!
//! One container instance processes one job at a time; the provider's queue
//! supplies requests and handles retries. The model is loaded once per
//! container into an explicitly owned handle and reused across requests.
//! Every failure during generation is returned as a structured
//! `{"error": ...}` result rather than propagated, so the provider sees a
//! normal completion and does not retry.

mod audio;
pub mod cache;
mod command_model;
mod handler;
mod model;
mod request;
mod server;

pub use audio::encode_wav;
pub use command_model::{CommandLoader, CommandModel};
pub use handler::{HandlerConfig, handle};
pub use model::{ModelHandle, ModelLoader, SpeechModel, SynthesisRequest, Waveform};
pub use request::{AdminCommand, InferInput, WorkerRequest, WorkerResponse};
pub use server::{WorkerState, router, serve};
