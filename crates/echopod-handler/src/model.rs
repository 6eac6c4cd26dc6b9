use std::path::{Path, PathBuf};

/// Mono audio produced by a model
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Interleaved f32 samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sample_rate: u32,
}

/// Parameters for one synchronous generation call
#[derive(Debug)]
pub struct SynthesisRequest<'a> {
    /// Text to synthesize
    pub text: &'a str,
    /// Sampling temperature
    pub temperature: f64,
    /// Top-p sampling value
    pub top_p: f64,
    /// Random seed for reproducible outputs
    pub seed: Option<u64>,
    /// Decoded reference audio for voice cloning
    pub audio_prompt: Option<&'a [u8]>,
}

/// A loaded text-to-speech model
///
/// Generation is synchronous; the worker serves one request at a time.
pub trait SpeechModel: Send {
    /// Synthesize audio for the request
    fn generate(&mut self, request: &SynthesisRequest<'_>) -> anyhow::Result<Waveform>;
}

/// Loads a model, optionally caching weights under a directory
pub trait ModelLoader: Send {
    /// Load the model
    fn load(&self, cache_dir: Option<&Path>) -> anyhow::Result<Box<dyn SpeechModel>>;
}

/// Explicitly owned, lazily initialized model handle
///
/// Replaces the usual process-global: the handle is constructed once at
/// startup and passed into the request handler, which may load, reuse, or
/// reload the model through it.
pub struct ModelHandle {
    loader: Box<dyn ModelLoader>,
    model: Option<Box<dyn SpeechModel>>,
    cache_dir: Option<PathBuf>,
}

impl ModelHandle {
    /// Create an unloaded handle
    pub fn new(loader: Box<dyn ModelLoader>, cache_dir: Option<PathBuf>) -> Self {
        Self {
            loader,
            model: None,
            cache_dir,
        }
    }

    /// Whether a model is currently loaded
    pub const fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Cache directory in effect for loads
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Get the loaded model, loading it on first use
    ///
    /// # Errors
    ///
    /// Returns the loader's error when the model cannot be loaded
    pub fn get_or_load(&mut self) -> anyhow::Result<&mut dyn SpeechModel> {
        if self.model.is_none() {
            tracing::info!(cache_dir = ?self.cache_dir, "loading model");
            self.model = Some(self.loader.load(self.cache_dir.as_deref())?);
            tracing::info!("model loaded");
        }

        Ok(self
            .model
            .as_mut()
            .map(AsMut::as_mut)
            .expect("model populated above"))
    }

    /// Drop the cached model and load it again
    ///
    /// # Errors
    ///
    /// Returns the loader's error; the handle is left unloaded on failure
    pub fn refresh(&mut self) -> anyhow::Result<()> {
        tracing::info!("refreshing model");
        self.model = None;
        self.get_or_load()?;
        Ok(())
    }

    /// Change the cache directory; the model reloads on next use
    pub fn set_cache_dir(&mut self, path: PathBuf) {
        self.cache_dir = Some(path);
        self.model = None;
    }
}
