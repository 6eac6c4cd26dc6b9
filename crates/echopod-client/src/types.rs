use serde::{Deserialize, Serialize};

/// Provider-owned job state machine
///
/// Transitions are monotonic: QUEUED → IN_PROGRESS → one of the terminal
/// states. `IN_QUEUE` is the wire spelling the provider uses for QUEUED;
/// any other unrecognized wire value decodes to [`JobStatus::Unknown`] and
/// is treated as still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting for a worker
    #[serde(alias = "IN_QUEUE")]
    Queued,
    /// A worker is processing the job
    InProgress,
    /// Finished; output is available
    Completed,
    /// Terminal failure reported by the provider
    Failed,
    /// Cancelled before completion
    Cancelled,
    /// Unrecognized wire value, treated as non-terminal
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether the job can no longer change state
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Input payload for one inference job
#[derive(Debug, Clone, Serialize)]
pub struct JobInput {
    /// Text to synthesize
    pub text: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Top-p sampling value
    pub top_p: f64,
    /// Random seed for reproducible outputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Base64-encoded reference audio for voice cloning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_prompt: Option<String>,
    /// Ask the worker to reload the model before generating
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_refresh: bool,
}

/// Output payload of a completed job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOutput {
    /// Base64-encoded WAV audio
    #[serde(default)]
    pub audio: Option<String>,
    /// Audio container format (always "wav")
    #[serde(default)]
    pub format: Option<String>,
    /// Sample rate of the audio
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// Error reported by the handler as a normal result
    #[serde(default)]
    pub error: Option<String>,
    /// Acknowledgement message for admin jobs
    #[serde(default)]
    pub status: Option<String>,
}

/// A job's status as reported by `GET /status/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    /// Job id
    #[serde(default)]
    pub id: Option<String>,
    /// Current state
    pub status: JobStatus,
    /// Output, present once terminal
    #[serde(default)]
    pub output: Option<JobOutput>,
    /// Provider-level error for FAILED/CANCELLED jobs
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_decodes_wire_values() {
        let cases = [
            ("\"IN_QUEUE\"", JobStatus::Queued),
            ("\"QUEUED\"", JobStatus::Queued),
            ("\"IN_PROGRESS\"", JobStatus::InProgress),
            ("\"COMPLETED\"", JobStatus::Completed),
            ("\"FAILED\"", JobStatus::Failed),
            ("\"CANCELLED\"", JobStatus::Cancelled),
            ("\"TIMED_OUT\"", JobStatus::Unknown),
        ];
        for (wire, expected) in cases {
            let status: JobStatus = serde_json::from_str(wire).unwrap();
            assert_eq!(status, expected, "{wire}");
        }
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn input_omits_unset_options() {
        let input = JobInput {
            text: "[S1] Hello.".to_owned(),
            temperature: 1.3,
            top_p: 0.95,
            seed: None,
            audio_prompt: None,
            force_refresh: false,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["text"], "[S1] Hello.");
        assert!(json.get("seed").is_none());
        assert!(json.get("audio_prompt").is_none());
        assert!(json.get("force_refresh").is_none());
    }

    #[test]
    fn input_includes_set_options() {
        let input = JobInput {
            text: "hi".to_owned(),
            temperature: 1.0,
            top_p: 0.9,
            seed: Some(42),
            audio_prompt: Some("AAAA".to_owned()),
            force_refresh: true,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["audio_prompt"], "AAAA");
        assert_eq!(json["force_refresh"], true);
    }

    #[test]
    fn record_decodes_nested_output() {
        let record: JobRecord = serde_json::from_str(
            r#"{"id": "abc123", "status": "COMPLETED", "output": {"audio": "UklGRg==", "format": "wav", "sample_rate": 44100}}"#,
        )
        .unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        let output = record.output.unwrap();
        assert_eq!(output.format.as_deref(), Some("wav"));
        assert_eq!(output.sample_rate, Some(44100));
    }
}
