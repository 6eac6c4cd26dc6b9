#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use anyhow::Context as _;
use args::{Args, Command};
use clap::Parser;
use echopod_config::Config;
use echopod_runpod::ManagementClient;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

const BANNER: &str = r"
   ___  ____/ /  ___  ___  ___  ___/ /
  / -_) __/ _ \/ _ \/ _ \/ _ \/ _  /
  \__/\__/_//_/\___/ .__/\___/\_,_/
                  /_/
        RunPod serverless TTS
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("{BANNER}");

    let args = Args::parse();
    let config = Config::load()?;

    // Setup runs before any credentials exist
    if let Command::Setup { force } = &args.command {
        return commands::setup(*force);
    }

    let api_key = match &args.api_key {
        Some(key) => SecretString::from(key.clone()),
        None => config.require_api_key()?,
    };
    let client = ManagementClient::new(api_key);

    let endpoint_id = || -> anyhow::Result<String> {
        args.endpoint_id
            .clone()
            .or_else(|| config.endpoint_id.clone())
            .context("no endpoint id; pass --endpoint-id or deploy an endpoint first")
    };

    match &args.command {
        Command::Setup { .. } => unreachable!("handled above"),
        Command::CreateTemplate(template_args) => commands::create_template(&client, template_args).await,
        Command::Deploy(deploy_args) => commands::deploy(&client, &config, deploy_args).await,
        Command::Update(update_args) => commands::update(&client, &endpoint_id()?, update_args).await,
        Command::Status => commands::status(&client, &endpoint_id()?).await,
        Command::Delete { force } => commands::delete(&client, &endpoint_id()?, *force).await,
        Command::DeleteTemplate { template_id, force } => {
            commands::delete_template(&client, &config, template_id.clone(), *force).await
        }
    }
}
