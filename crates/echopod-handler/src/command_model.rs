//! Model seam backed by an external inference process
//!
//! The repo ships no inference engine: the pretrained model is an opaque
//! dependency of the container image. The worker talks to it through a
//! child process that reads one JSON request on stdin and writes raw
//! little-endian f32 samples to stdout.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use crate::model::{ModelLoader, SpeechModel, SynthesisRequest, Waveform};

/// Environment variable naming the inference command
pub const MODEL_CMD_VAR: &str = "ECHOPOD_MODEL_CMD";

/// Environment variable naming the pretrained model
pub const MODEL_ID_VAR: &str = "MODEL_ID";

const DEFAULT_MODEL_ID: &str = "nari-labs/Dia-1.6B";
const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Loader for [`CommandModel`]
pub struct CommandLoader {
    command: String,
    model_id: String,
}

impl CommandLoader {
    /// Build a loader from `ECHOPOD_MODEL_CMD` and `MODEL_ID`
    ///
    /// # Errors
    ///
    /// Returns an error when the inference command is not configured
    pub fn from_env() -> anyhow::Result<Self> {
        let command = std::env::var(MODEL_CMD_VAR)
            .with_context(|| format!("{MODEL_CMD_VAR} must name the inference command"))?;
        let model_id = std::env::var(MODEL_ID_VAR).unwrap_or_else(|_| DEFAULT_MODEL_ID.to_owned());

        Ok(Self { command, model_id })
    }

    /// Build a loader for an explicit command
    pub fn new(command: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            model_id: model_id.into(),
        }
    }
}

impl ModelLoader for CommandLoader {
    fn load(&self, cache_dir: Option<&Path>) -> anyhow::Result<Box<dyn SpeechModel>> {
        let cache_env = cache_dir.map(|dir| {
            let hf_cache = dir.join("hf_cache");
            let torch_cache = dir.join("torch_cache");
            let _ = std::fs::create_dir_all(&hf_cache);
            let _ = std::fs::create_dir_all(&torch_cache);
            (hf_cache, torch_cache)
        });

        tracing::info!(model_id = %self.model_id, command = %self.command, "configuring external model");

        Ok(Box::new(CommandModel {
            command: self.command.clone(),
            model_id: self.model_id.clone(),
            cache_env,
        }))
    }
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    model_id: &'a str,
    text: &'a str,
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_prompt: Option<String>,
    /// The serverless image carries no C compiler; the model process must
    /// run in eager mode
    use_compile: bool,
    sample_rate: u32,
}

/// Model that shells out to the configured inference command per request
pub struct CommandModel {
    command: String,
    model_id: String,
    cache_env: Option<(std::path::PathBuf, std::path::PathBuf)>,
}

impl SpeechModel for CommandModel {
    fn generate(&mut self, request: &SynthesisRequest<'_>) -> anyhow::Result<Waveform> {
        let payload = serde_json::to_vec(&CommandRequest {
            model_id: &self.model_id,
            text: request.text,
            temperature: request.temperature,
            top_p: request.top_p,
            seed: request.seed,
            audio_prompt: request.audio_prompt.map(|bytes| BASE64.encode(bytes)),
            use_compile: false,
            sample_rate: OUTPUT_SAMPLE_RATE,
        })?;

        let mut parts = self.command.split_whitespace();
        let program = parts.next().context("inference command is empty")?;

        let mut command = Command::new(program);
        command.args(parts).stdin(Stdio::piped()).stdout(Stdio::piped());

        if let Some((hf_cache, torch_cache)) = &self.cache_env {
            command
                .env("HF_HOME", hf_cache)
                .env("TRANSFORMERS_CACHE", hf_cache)
                .env("TORCH_HOME", torch_cache);
        }

        let mut child = command.spawn().context("failed to spawn inference command")?;

        child
            .stdin
            .take()
            .context("inference command has no stdin")?
            .write_all(&payload)
            .context("failed to write request to inference command")?;

        let output = child
            .wait_with_output()
            .context("failed to read inference command output")?;

        if !output.status.success() {
            anyhow::bail!("inference command exited with {}", output.status);
        }

        Ok(Waveform {
            samples: samples_from_bytes(&output.stdout)?,
            sample_rate: OUTPUT_SAMPLE_RATE,
        })
    }
}

/// Interpret raw little-endian f32 output as samples
fn samples_from_bytes(bytes: &[u8]) -> anyhow::Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        anyhow::bail!("inference output is not a whole number of f32 samples ({} bytes)", bytes.len());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
