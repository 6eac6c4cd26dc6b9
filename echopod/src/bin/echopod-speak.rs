#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Inference CLI: generate speech on the deployed endpoint

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use echopod_client::{AudioSink, SpeechOptions, TtsClient};
use echopod_config::Config;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

/// Generate speech with the deployed echopod endpoint
#[derive(Debug, Parser)]
#[command(name = "echopod-speak")]
struct Args {
    /// Text to synthesize, e.g. "[S1] Hello there."
    #[arg(required_unless_present_any = ["status", "refresh_model"])]
    text: Option<String>,

    /// Output WAV path
    #[arg(short, long, default_value = "output.wav")]
    output: PathBuf,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Top-p sampling value
    #[arg(short = 'p', long)]
    top_p: Option<f64>,

    /// Random seed for reproducible outputs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Reference audio file for voice cloning
    #[arg(short, long)]
    audio_prompt: Option<PathBuf>,

    /// Endpoint id (overrides the environment and .env)
    #[arg(short, long)]
    endpoint_id: Option<String>,

    /// RunPod API key (overrides the environment and .env)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Overall timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Report playback progress chunk by chunk instead of waiting silently
    #[arg(long)]
    stream: bool,

    /// Check the status of an existing job instead of submitting one
    #[arg(long, value_name = "JOB_ID")]
    status: Option<String>,

    /// Ask the worker to reload the model before generating
    #[arg(long)]
    force_refresh: bool,

    /// Submit a refresh_model admin job and exit
    #[arg(long)]
    refresh_model: bool,
}

/// Sink that reports streaming progress on stderr
#[derive(Default)]
struct ProgressSink {
    chunks: usize,
    samples: u64,
}

impl AudioSink for ProgressSink {
    fn play(&mut self, chunk: &[f32], sample_rate: u32) {
        self.chunks += 1;
        self.samples += chunk.len() as u64;
        let seconds = self.samples / u64::from(sample_rate.max(1));
        eprint!("\rstreaming: {seconds}s");
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    let api_key = match &args.api_key {
        Some(key) => SecretString::from(key.clone()),
        None => config.require_api_key()?,
    };
    let endpoint_id = args
        .endpoint_id
        .clone()
        .or_else(|| config.endpoint_id.clone())
        .ok_or(echopod_config::ConfigError::MissingEndpointId)?;

    let client = TtsClient::new(&endpoint_id, api_key);

    if let Some(job_id) = &args.status {
        let record = client.job_status(job_id).await?;
        println!("Job {job_id}: {}", record.status);
        if let Some(error) = &record.error {
            println!("  error: {error}");
        }
        return Ok(());
    }

    let mut options = SpeechOptions::from_defaults(&config.defaults);
    if let Some(temperature) = args.temperature {
        options.temperature = temperature;
    }
    if let Some(top_p) = args.top_p {
        options.top_p = top_p;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    options.audio_prompt = args.audio_prompt.clone();
    options.force_refresh = args.force_refresh;
    options.timeout = Duration::from_secs(args.timeout);
    options.save_path = Some(args.output.clone());

    if args.refresh_model {
        let ack = client.refresh_model(&options).await?;
        println!("{ack}");
        return Ok(());
    }

    let text = args.text.as_deref().context("TEXT is required")?;

    if args.stream {
        let options = options.streaming();
        let (audio, sink) = client.stream_speech(text, &options, ProgressSink::default()).await?;
        eprintln!();
        println!(
            "Streamed {} chunks; saved {} bytes to {}",
            sink.chunks,
            audio.len(),
            args.output.display()
        );
    } else {
        let audio = client.generate_speech(text, &options).await?;
        println!("Saved {} bytes to {}", audio.len(), args.output.display());
    }

    Ok(())
}
