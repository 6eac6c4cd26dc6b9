use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::error::{ClientError, Result};
use crate::http_client::http_client;
use crate::types::{JobInput, JobRecord, JobStatus};

/// Base URL for the RunPod serverless API
///
/// Inference runs against the `.ai` domain; endpoint management uses the
/// `.io` domain handled by `echopod-runpod`.
pub const SERVERLESS_API_URL: &str = "https://api.runpod.ai/v2";

/// Options for one speech generation request
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    /// Sampling temperature
    pub temperature: f64,
    /// Top-p sampling value
    pub top_p: f64,
    /// Random seed for reproducible outputs
    pub seed: Option<u64>,
    /// Reference audio file for voice cloning, base64-encoded into the payload
    pub audio_prompt: Option<PathBuf>,
    /// Ask the worker to reload the model before generating
    pub force_refresh: bool,
    /// Write the decoded audio to this path on success
    pub save_path: Option<PathBuf>,
    /// Delay between status polls
    pub polling_interval: Duration,
    /// Wall-clock deadline for the whole operation
    pub timeout: Duration,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            temperature: 1.3,
            top_p: 0.95,
            seed: None,
            audio_prompt: None,
            force_refresh: false,
            save_path: None,
            polling_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

impl SpeechOptions {
    /// Options seeded from configured generation defaults
    pub fn from_defaults(defaults: &echopod_config::GenerationDefaults) -> Self {
        Self {
            temperature: defaults.temperature,
            top_p: defaults.top_p,
            seed: defaults.seed,
            ..Self::default()
        }
    }

    /// Options tuned for streaming playback (faster polling)
    #[must_use]
    pub fn streaming(mut self) -> Self {
        self.polling_interval = Duration::from_millis(500);
        self
    }
}

/// Client for a deployed TTS serverless endpoint
pub struct TtsClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl TtsClient {
    /// Create a client for the given endpoint
    pub fn new(endpoint_id: &str, api_key: SecretString) -> Self {
        Self {
            http: http_client(),
            api_key,
            base_url: format!("{SERVERLESS_API_URL}/{endpoint_id}"),
        }
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when the API key or endpoint id is missing
    pub fn from_config(config: &echopod_config::Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let endpoint_id = config.require_endpoint_id()?;
        Ok(Self::new(&endpoint_id, api_key))
    }

    /// Override the endpoint base URL (used by tests against a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate speech for `text`, returning the decoded WAV bytes
    ///
    /// Submits one job, polls until terminal or the deadline passes, and
    /// decodes the audio payload. On timeout the remote job is left running;
    /// its id is logged so it can be inspected later.
    pub async fn generate_speech(&self, text: &str, options: &SpeechOptions) -> Result<Vec<u8>> {
        let input = self.build_input(text, options)?;
        let job_id = self.submit(&input).await?;

        tracing::info!(job_id, "job submitted");

        let record = self.poll_until_terminal(&job_id, options).await?;
        let audio = extract_audio(&record)?;

        if let Some(path) = &options.save_path {
            tokio::fs::write(path, &audio)
                .await
                .map_err(|source| ClientError::Io { path: path.clone(), source })?;
            tracing::info!(path = %path.display(), "audio saved");
        }

        Ok(audio)
    }

    /// Ask the endpoint to reload its model, waiting for the acknowledgement
    ///
    /// Submits a `refresh_model` admin job and polls it like any other job.
    /// Returns the worker's acknowledgement message.
    pub async fn refresh_model(&self, options: &SpeechOptions) -> Result<String> {
        let job_id = self.submit_raw(&json!({ "command": "refresh_model" })).await?;
        tracing::info!(job_id, "refresh job submitted");

        let record = self.poll_until_terminal(&job_id, options).await?;
        let output = record.output.ok_or(ClientError::EmptyResult)?;

        if let Some(error) = output.error {
            return Err(ClientError::JobFailed {
                state: "failed".to_owned(),
                message: error,
            });
        }

        Ok(output.status.unwrap_or_else(|| "model refreshed".to_owned()))
    }

    /// Fetch the current status of a job
    pub async fn job_status(&self, job_id: &str) -> Result<JobRecord> {
        let url = format!("{}/status/{job_id}", self.base_url);
        let response = self.authorized(self.http.get(&url)).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Validate inputs and build the job payload
    pub(crate) fn build_input(&self, text: &str, options: &SpeechOptions) -> Result<JobInput> {
        if text.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "no text provided for speech generation".to_owned(),
            ));
        }

        let audio_prompt = match &options.audio_prompt {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|source| ClientError::Io { path: path.clone(), source })?;
                Some(BASE64.encode(bytes))
            }
            None => None,
        };

        Ok(JobInput {
            text: text.to_owned(),
            temperature: options.temperature,
            top_p: options.top_p,
            seed: options.seed,
            audio_prompt,
            force_refresh: options.force_refresh,
        })
    }

    /// Submit a job, returning its id
    pub(crate) async fn submit(&self, input: &JobInput) -> Result<String> {
        self.submit_raw(input).await
    }

    /// Submit an arbitrary job input, returning the job id
    async fn submit_raw<T: serde::Serialize>(&self, input: &T) -> Result<String> {
        let url = format!("{}/run", self.base_url);
        let response = self
            .authorized(self.http.post(&url))
            .json(&json!({ "input": input }))
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;

        body.get("id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ClientError::Submission(body.to_string()))
    }

    /// Poll until the job reaches a terminal state or the deadline passes
    ///
    /// The deadline is checked before each request, so the total elapsed time
    /// never exceeds `timeout + polling_interval`.
    pub(crate) async fn poll_until_terminal(&self, job_id: &str, options: &SpeechOptions) -> Result<JobRecord> {
        let started = Instant::now();

        loop {
            if started.elapsed() > options.timeout {
                tracing::warn!(job_id, "polling deadline passed; job left running remotely");
                return Err(ClientError::Timeout(options.timeout));
            }

            let record = self.job_status(job_id).await?;
            tracing::debug!(job_id, status = %record.status, "poll");

            match record.status {
                JobStatus::Completed => return Ok(record),
                JobStatus::Failed | JobStatus::Cancelled => {
                    return Err(ClientError::JobFailed {
                        state: record.status.to_string(),
                        message: record.error.unwrap_or_else(|| "Unknown error".to_owned()),
                    });
                }
                _ => tokio::time::sleep(options.polling_interval).await,
            }
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
    }
}

/// Decode the audio payload from a completed job record
pub(crate) fn extract_audio(record: &JobRecord) -> Result<Vec<u8>> {
    let output = record.output.as_ref().ok_or(ClientError::EmptyResult)?;

    if let Some(error) = &output.error {
        return Err(ClientError::JobFailed {
            state: "failed".to_owned(),
            message: error.clone(),
        });
    }

    let audio_b64 = output
        .audio
        .as_deref()
        .filter(|audio| !audio.is_empty())
        .ok_or(ClientError::EmptyResult)?;

    Ok(BASE64.decode(audio_b64)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobOutput;

    fn client() -> TtsClient {
        TtsClient::new("ep-test", SecretString::from("key"))
    }

    #[test]
    fn base_url_uses_serverless_domain() {
        let client = client();
        assert_eq!(client.base_url, "https://api.runpod.ai/v2/ep-test");
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = client().build_input("   ", &SpeechOptions::default()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn missing_audio_prompt_file_fails_before_submit() {
        let options = SpeechOptions {
            audio_prompt: Some(PathBuf::from("/nonexistent/voice.wav")),
            ..SpeechOptions::default()
        };
        let err = client().build_input("hello", &options).unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }

    #[test]
    fn audio_prompt_round_trips_through_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        let payload = [0u8, 1, 2, 250, 251, 252];
        std::fs::write(&path, payload).unwrap();

        let options = SpeechOptions {
            audio_prompt: Some(path),
            ..SpeechOptions::default()
        };
        let input = client().build_input("hello", &options).unwrap();
        let decoded = BASE64.decode(input.audio_prompt.unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn completed_with_error_output_is_failure() {
        let record = JobRecord {
            id: Some("abc".to_owned()),
            status: JobStatus::Completed,
            output: Some(JobOutput {
                error: Some("OOM".to_owned()),
                ..JobOutput::default()
            }),
            error: None,
        };
        let err = extract_audio(&record).unwrap_err();
        assert_eq!(err.to_string(), "Job failed: OOM");
    }

    #[test]
    fn completed_without_audio_is_empty_result() {
        let record = JobRecord {
            id: None,
            status: JobStatus::Completed,
            output: Some(JobOutput::default()),
            error: None,
        };
        assert!(matches!(extract_audio(&record).unwrap_err(), ClientError::EmptyResult));
    }

    #[test]
    fn completed_audio_decodes() {
        let record = JobRecord {
            id: None,
            status: JobStatus::Completed,
            output: Some(JobOutput {
                audio: Some(BASE64.encode(b"RIFFdata")),
                format: Some("wav".to_owned()),
                sample_rate: Some(44100),
                ..JobOutput::default()
            }),
            error: None,
        };
        assert_eq!(extract_audio(&record).unwrap(), b"RIFFdata");
    }

    #[test]
    fn streaming_options_poll_faster() {
        let options = SpeechOptions::default().streaming();
        assert_eq!(options.polling_interval, Duration::from_millis(500));
        assert_eq!(options.timeout, Duration::from_secs(300));
    }
}
