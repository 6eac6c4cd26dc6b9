use serde::{Deserialize, Serialize};

/// Request body for creating a serverless endpoint via the REST API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEndpointRequest {
    /// Endpoint name
    pub name: String,
    /// Template the workers run
    pub template_id: String,
    /// GPU types workers may be scheduled on, in RunPod's naming
    pub gpu_type_ids: Vec<String>,
    /// Compute type, always "GPU" for this workload
    pub compute_type: String,
    /// Minimum active workers
    pub workers_min: u32,
    /// Maximum active workers
    pub workers_max: u32,
    /// Worker idle timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,
    /// Keep workers warm for faster cold starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashboot: Option<bool>,
    /// Network volume to mount into workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_volume_id: Option<String>,
}

impl CreateEndpointRequest {
    /// Build a request with the standard defaults for this workload
    pub fn new(name: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_id: template_id.into(),
            gpu_type_ids: crate::gpu::default_gpu_type_ids(),
            compute_type: "GPU".to_owned(),
            workers_min: 0,
            workers_max: 3,
            idle_timeout: Some(300),
            flashboot: Some(true),
            network_volume_id: None,
        }
    }
}

/// A serverless endpoint as reported by the management APIs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint id
    pub id: String,
    /// Endpoint name
    #[serde(default)]
    pub name: Option<String>,
    /// Template the workers run
    #[serde(default)]
    pub template_id: Option<String>,
    /// GPU types workers may be scheduled on
    ///
    /// The GraphQL mutations report this as `gpuIds`, the REST API as
    /// `gpuTypeIds`.
    #[serde(default, alias = "gpuIds")]
    pub gpu_type_ids: Vec<String>,
    /// Minimum active workers
    #[serde(default, alias = "minWorkers")]
    pub workers_min: u32,
    /// Maximum active workers
    #[serde(default, alias = "maxWorkers")]
    pub workers_max: u32,
    /// Worker idle timeout in seconds
    #[serde(default)]
    pub idle_timeout: u32,
    /// Whether flash boot is enabled
    #[serde(default, alias = "flashBoot")]
    pub flashboot: bool,
    /// Attached network volume, if any
    #[serde(default)]
    pub network_volume_id: Option<String>,
}

/// Rolling metrics for an endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetrics {
    /// Workers currently processing requests
    #[serde(default)]
    pub workers_running: u32,
    /// Workers waiting to start
    #[serde(default)]
    pub workers_waiting: u32,
    /// Requests handled since creation
    #[serde(default)]
    pub requests_handled: u64,
    /// Requests that errored
    #[serde(default)]
    pub requests_errors: u64,
    /// Average response time in milliseconds
    #[serde(default)]
    pub average_response_time: f64,
    /// Timestamp of the most recent request
    #[serde(default)]
    pub last_request_timestamp: Option<String>,
}

/// Environment entry for a template, optionally marked secret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvKv {
    /// Variable name
    pub key: String,
    /// Variable value
    pub value: String,
    /// Whether RunPod should treat the value as a secret
    #[serde(default, rename = "isSecret", skip_serializing_if = "std::ops::Not::not")]
    pub is_secret: bool,
}

/// Parameters for creating a template via GraphQL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    /// Template name
    pub name: String,
    /// Docker image the workers run
    pub image_name: String,
    /// Container disk size in GB
    pub container_disk_size: u32,
    /// Environment variables and secrets for the container
    pub env: Vec<EnvKv>,
    /// Exposed ports as a JSON string, per the GraphQL schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    /// Template readme shown in the RunPod console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    /// Network volume size in GB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_in_gb: Option<u32>,
    /// Mount path for the network volume inside the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mount_path: Option<String>,
}

/// A template as returned by the createTemplate mutation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template id
    pub id: String,
    /// Template name
    pub name: String,
    /// Docker image the workers run
    pub image_name: String,
    /// Container disk size in GB
    #[serde(default)]
    pub container_disk_size: u32,
    /// Network volume size in GB
    #[serde(default)]
    pub volume_in_gb: Option<u32>,
    /// Mount path for the network volume
    #[serde(default)]
    pub volume_mount_path: Option<String>,
    /// Environment variables and secrets
    #[serde(default)]
    pub env: Vec<EnvKv>,
}

/// Fields to change on an existing endpoint via GraphQL
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEndpointRequest {
    /// New minimum active workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_workers: Option<u32>,
    /// New maximum active workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<u32>,
    /// New worker idle timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,
    /// New GPU type list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_ids: Option<Vec<String>>,
}
