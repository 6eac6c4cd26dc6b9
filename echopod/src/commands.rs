use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use echopod_config::{Config, ENDPOINT_ID_VAR, EnvFile, NETWORK_VOLUME_ID_VAR, TEMPLATE_ID_VAR};
use echopod_runpod::{
    CreateEndpointRequest, Endpoint, EndpointMetrics, EnvKv, ManagementClient, TemplateSpec, UpdateEndpointRequest,
};

use crate::args::{CreateTemplateArgs, DeployArgs, UpdateArgs};

const ENV_FILE: &str = ".env";
const ENV_EXAMPLE: &str = include_str!("../../.env.example");

/// Write a starter `.env` from the bundled example
pub fn setup(force: bool) -> anyhow::Result<()> {
    let path = Path::new(ENV_FILE);

    if path.exists() && !force {
        println!(".env already exists; use --force to overwrite it.");
        return Ok(());
    }

    std::fs::write(path, ENV_EXAMPLE).context("failed to write .env")?;

    println!("Created .env. Next steps:");
    println!("  1. Edit .env and set RUNPOD_API_KEY");
    println!("  2. Run `echopod create-template` to create a worker template");
    println!("  3. Run `echopod deploy` to deploy the endpoint");
    Ok(())
}

/// Create a worker template, persisting its id for deploys
pub async fn create_template(client: &ManagementClient, args: &CreateTemplateArgs) -> anyhow::Result<()> {
    let mut env = vec![
        plain("MODEL_ID", "nari-labs/Dia-1.6B"),
        plain("COMPUTE_DTYPE", "float16"),
        plain("DEFAULT_TEMPERATURE", "1.3"),
        plain("DEFAULT_TOP_P", "0.95"),
    ];

    if let Some(token) = &args.hf_token {
        env.push(EnvKv {
            key: "HUGGING_FACE_TOKEN".to_owned(),
            value: token.clone(),
            is_secret: true,
        });
    } else {
        println!("Warning: no Hugging Face token provided; model downloads may fail.");
    }

    let spec = TemplateSpec {
        name: args.name.clone(),
        image_name: args.image.clone(),
        container_disk_size: args.disk_size,
        env,
        ports: Some("8000/http".to_owned()),
        readme: None,
        volume_in_gb: None,
        volume_mount_path: args.volume_id.as_ref().map(|_| args.volume_path.clone()),
    };

    let template = client.create_template(&spec).await?;

    println!("Template created: {} ({})", template.name, template.id);
    persist(TEMPLATE_ID_VAR, &template.id)?;
    if let Some(volume_id) = &args.volume_id {
        persist(NETWORK_VOLUME_ID_VAR, volume_id)?;
    }
    Ok(())
}

/// Deploy a serverless endpoint, persisting its id for the inference client
pub async fn deploy(client: &ManagementClient, config: &Config, args: &DeployArgs) -> anyhow::Result<()> {
    let template_id = args
        .template_id
        .clone()
        .or_else(|| config.template_id.clone())
        .context("no template id; pass --template-id or run `echopod create-template` first")?;

    println!("Deploying endpoint '{}' from template {template_id}...", args.name);

    let mut request = CreateEndpointRequest::new(&args.name, template_id);
    if let Some(min) = args.min_workers {
        request.workers_min = min;
    }
    if let Some(max) = args.max_workers {
        request.workers_max = max;
    }
    if let Some(idle) = args.idle_timeout {
        request.idle_timeout = Some(idle);
    }
    if args.no_flash_boot {
        request.flashboot = Some(false);
    }
    request.network_volume_id = args.network_volume_id.clone().or_else(|| config.network_volume_id.clone());

    let endpoint = client.create_endpoint(&request).await?;

    println!("Endpoint deployed.");
    print_endpoint(&endpoint);
    persist(ENDPOINT_ID_VAR, &endpoint.id)?;
    Ok(())
}

/// Change worker limits on an existing endpoint
pub async fn update(client: &ManagementClient, endpoint_id: &str, args: &UpdateArgs) -> anyhow::Result<()> {
    if args.min_workers.is_none() && args.max_workers.is_none() && args.idle_timeout.is_none() {
        anyhow::bail!("nothing to update; pass at least one of --min-workers, --max-workers, --idle-timeout");
    }

    let request = UpdateEndpointRequest {
        min_workers: args.min_workers,
        max_workers: args.max_workers,
        idle_timeout: args.idle_timeout,
        gpu_ids: None,
    };

    let endpoint = client.update_endpoint(endpoint_id, &request).await?;
    println!("Endpoint updated.");
    print_endpoint(&endpoint);
    Ok(())
}

/// Show endpoint details and rolling metrics
pub async fn status(client: &ManagementClient, endpoint_id: &str) -> anyhow::Result<()> {
    println!("Checking status of endpoint {endpoint_id}...");

    let endpoint = client.get_endpoint(endpoint_id).await?;
    print_endpoint(&endpoint);

    match client.get_metrics(endpoint_id).await {
        Ok(metrics) => print_metrics(&metrics),
        Err(e) => println!("  metrics unavailable: {e}"),
    }
    Ok(())
}

/// Terminate an endpoint, removing the persisted id on success
pub async fn delete(client: &ManagementClient, endpoint_id: &str, force: bool) -> anyhow::Result<()> {
    if !force && !confirm(&format!("Delete endpoint {endpoint_id}?"))? {
        println!("Aborted.");
        return Ok(());
    }

    client.delete_endpoint(endpoint_id).await?;
    println!("Endpoint {endpoint_id} deleted.");
    unpersist(ENDPOINT_ID_VAR)?;
    Ok(())
}

/// Delete a template, removing the persisted id on success
pub async fn delete_template(
    client: &ManagementClient,
    config: &Config,
    template_id: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let template_id = template_id
        .or_else(|| config.template_id.clone())
        .context("no template id; pass --template-id")?;

    if !force && !confirm(&format!("Delete template {template_id}?"))? {
        println!("Aborted.");
        return Ok(());
    }

    client.delete_template(&template_id).await?;
    println!("Template {template_id} deleted.");
    unpersist(TEMPLATE_ID_VAR)?;
    Ok(())
}

fn plain(key: &str, value: &str) -> EnvKv {
    EnvKv {
        key: key.to_owned(),
        value: value.to_owned(),
        is_secret: false,
    }
}

fn print_endpoint(endpoint: &Endpoint) {
    println!("Endpoint {}", endpoint.id);
    if let Some(name) = &endpoint.name {
        println!("  name:         {name}");
    }
    if let Some(template_id) = &endpoint.template_id {
        println!("  template:     {template_id}");
    }
    if !endpoint.gpu_type_ids.is_empty() {
        println!("  gpus:         {}", endpoint.gpu_type_ids.join(", "));
    }
    println!("  workers:      {}..{}", endpoint.workers_min, endpoint.workers_max);
    println!("  idle timeout: {}s", endpoint.idle_timeout);
    println!("  flash boot:   {}", endpoint.flashboot);
    if let Some(volume_id) = &endpoint.network_volume_id {
        println!("  volume:       {volume_id}");
    }
}

fn print_metrics(metrics: &EndpointMetrics) {
    println!("Metrics");
    println!("  workers running: {}", metrics.workers_running);
    println!("  workers waiting: {}", metrics.workers_waiting);
    println!("  requests:        {} ({} errors)", metrics.requests_handled, metrics.requests_errors);
    println!("  avg response:    {:.0}ms", metrics.average_response_time);
    if let Some(at) = &metrics.last_request_timestamp {
        println!("  last request:    {at}");
    }
}

/// Ask a yes/no question on the terminal, defaulting to no
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Write a key into `.env`, creating the file if needed
fn persist(key: &str, value: &str) -> anyhow::Result<()> {
    let path = Path::new(ENV_FILE);
    let mut file = if path.exists() {
        EnvFile::load(path).context("failed to read .env")?
    } else {
        EnvFile::new(path.to_path_buf())
    };

    file.set(key, value);
    file.save().context("failed to write .env")?;
    println!("Saved {key} to .env");
    Ok(())
}

/// Drop a key from `.env` when the file exists
fn unpersist(key: &str) -> anyhow::Result<()> {
    let path = Path::new(ENV_FILE);
    if !path.exists() {
        return Ok(());
    }

    let mut file = EnvFile::load(path).context("failed to read .env")?;
    file.remove(key);
    file.save().context("failed to write .env")?;
    println!("Removed {key} from .env");
    Ok(())
}
