use clap::{Parser, Subcommand};

/// echopod management CLI
#[derive(Debug, Parser)]
#[command(name = "echopod", about = "Deploy and manage a serverless TTS endpoint on RunPod")]
pub struct Args {
    /// RunPod API key (overrides the environment and .env)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Endpoint id (overrides the environment and .env)
    #[arg(long, global = true)]
    pub endpoint_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a starter .env file
    Setup {
        /// Overwrite an existing .env
        #[arg(long)]
        force: bool,
    },

    /// Create a worker template
    CreateTemplate(CreateTemplateArgs),

    /// Deploy a serverless endpoint from the template
    Deploy(DeployArgs),

    /// Change worker limits on the deployed endpoint
    Update(UpdateArgs),

    /// Show endpoint details and metrics
    Status,

    /// Terminate the deployed endpoint
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Delete the worker template
    DeleteTemplate {
        /// Template id (falls back to TEMPLATE_ID)
        #[arg(long)]
        template_id: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct CreateTemplateArgs {
    /// Template name
    #[arg(long, default_value = "echopod-tts")]
    pub name: String,

    /// Docker image the workers run
    #[arg(long, default_value = "echopod/echopod-worker:latest")]
    pub image: String,

    /// Container disk size in GB
    #[arg(long, default_value_t = 20)]
    pub disk_size: u32,

    /// Network volume id, recorded for later deploys
    #[arg(long)]
    pub volume_id: Option<String>,

    /// Mount path for the network volume inside the container
    #[arg(long, default_value = "/runpod-volume")]
    pub volume_path: String,

    /// Hugging Face token, stored as a template secret
    #[arg(long, env = "HUGGINGFACE_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct DeployArgs {
    /// Endpoint name
    #[arg(long, default_value = "echopod-tts")]
    pub name: String,

    /// Template id (falls back to TEMPLATE_ID)
    #[arg(long)]
    pub template_id: Option<String>,

    /// Minimum active workers
    #[arg(long)]
    pub min_workers: Option<u32>,

    /// Maximum active workers
    #[arg(long)]
    pub max_workers: Option<u32>,

    /// Worker idle timeout in seconds
    #[arg(long)]
    pub idle_timeout: Option<u32>,

    /// Disable flash boot
    #[arg(long)]
    pub no_flash_boot: bool,

    /// Network volume id to attach (falls back to NETWORK_VOLUME_ID)
    #[arg(long)]
    pub network_volume_id: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    /// New minimum active workers
    #[arg(long)]
    pub min_workers: Option<u32>,

    /// New maximum active workers
    #[arg(long)]
    pub max_workers: Option<u32>,

    /// New worker idle timeout in seconds
    #[arg(long)]
    pub idle_timeout: Option<u32>,
}
