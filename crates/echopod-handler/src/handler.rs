use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::audio::encode_wav;
use crate::cache;
use crate::model::{ModelHandle, SynthesisRequest};
use crate::request::{AdminCommand, InferInput, WorkerRequest, WorkerResponse};

/// Worker-level defaults applied when a request omits a parameter
#[derive(Debug, Clone, Copy)]
pub struct HandlerConfig {
    /// Default sampling temperature
    pub default_temperature: f64,
    /// Default top-p sampling value
    pub default_top_p: f64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            default_temperature: 1.3,
            default_top_p: 0.95,
        }
    }
}

impl HandlerConfig {
    /// Read defaults from `DEFAULT_TEMPERATURE` / `DEFAULT_TOP_P`,
    /// falling back to the built-in values on missing or unparsable input
    pub fn from_env() -> Self {
        let parse = |name: &str, fallback: f64| {
            std::env::var(name)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            default_temperature: parse("DEFAULT_TEMPERATURE", 1.3),
            default_top_p: parse("DEFAULT_TOP_P", 0.95),
        }
    }
}

/// Process one decoded job request
///
/// Never panics or propagates: every failure becomes a
/// [`WorkerResponse::Error`] so the provider records a normal completion.
pub fn handle(request: WorkerRequest, model: &mut ModelHandle, config: &HandlerConfig) -> WorkerResponse {
    match request {
        WorkerRequest::Admin(command) => handle_admin(command, model),
        WorkerRequest::Infer(input) => handle_infer(&input, model, config),
    }
}

fn handle_admin(command: AdminCommand, model: &mut ModelHandle) -> WorkerResponse {
    match command {
        AdminCommand::RefreshModel => match model.refresh() {
            Ok(()) => WorkerResponse::Ack {
                status: "model refreshed".to_owned(),
            },
            Err(e) => WorkerResponse::error(format!("Error refreshing model: {e}")),
        },
        AdminCommand::SetCacheDir { path } => {
            if !cache::ensure_writable(&path) {
                return WorkerResponse::error(format!("Cache directory is not writable: {}", path.display()));
            }
            model.set_cache_dir(path.clone());
            WorkerResponse::Ack {
                status: format!("cache directory set to {}", path.display()),
            }
        }
        AdminCommand::DebugVolumes => WorkerResponse::Volumes {
            volumes: cache::probe_volumes(),
            mounts: cache::list_mounts(),
            active_cache_dir: model.cache_dir().map(std::path::Path::to_path_buf),
        },
    }
}

fn handle_infer(input: &InferInput, model: &mut ModelHandle, config: &HandlerConfig) -> WorkerResponse {
    if input.text.trim().is_empty() {
        return WorkerResponse::error("No text provided for speech generation.");
    }

    let audio_prompt = match &input.audio_prompt {
        Some(encoded) => match BASE64.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => return WorkerResponse::error(format!("Error decoding audio prompt: {e}")),
        },
        None => None,
    };

    if input.force_refresh
        && let Err(e) = model.refresh()
    {
        return WorkerResponse::error(format!("Error refreshing model: {e}"));
    }

    let loaded = match model.get_or_load() {
        Ok(loaded) => loaded,
        Err(e) => return WorkerResponse::error(format!("Error loading model: {e}")),
    };

    let request = SynthesisRequest {
        text: &input.text,
        temperature: input.temperature.unwrap_or(config.default_temperature),
        top_p: input.top_p.unwrap_or(config.default_top_p),
        seed: input.seed,
        audio_prompt: audio_prompt.as_deref(),
    };

    tracing::info!(
        text_len = request.text.len(),
        temperature = request.temperature,
        top_p = request.top_p,
        has_prompt = request.audio_prompt.is_some(),
        "generating speech"
    );

    let waveform = match loaded.generate(&request) {
        Ok(waveform) => waveform,
        Err(e) => return WorkerResponse::error(format!("Error generating speech: {e}")),
    };

    let wav = match encode_wav(&waveform) {
        Ok(wav) => wav,
        Err(e) => return WorkerResponse::error(format!("Error encoding audio: {e}")),
    };

    WorkerResponse::Audio {
        audio: BASE64.encode(wav),
        format: "wav",
        sample_rate: waveform.sample_rate,
    }
}
