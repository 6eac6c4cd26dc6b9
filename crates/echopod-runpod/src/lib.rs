#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Management client for RunPod serverless endpoints and templates
//!
//! RunPod splits its management surface across two APIs and the client
//! mirrors that: endpoint create/read/metrics and template deletion go
//! through the REST API at `rest.runpod.io`, while template creation and
//! endpoint update/termination are GraphQL mutations at `api.runpod.io`.

mod client;
mod error;
mod gpu;
mod http_client;
mod types;

pub use client::ManagementClient;
pub use error::{Result, RunpodError};
pub use gpu::map_gpu_type_ids;
pub use types::{
    CreateEndpointRequest, Endpoint, EndpointMetrics, EnvKv, Template, TemplateSpec, UpdateEndpointRequest,
};

/// Base URL for the RunPod REST management API
pub const REST_API_URL: &str = "https://rest.runpod.io/v1";

/// URL for the RunPod GraphQL management API
pub const GRAPHQL_API_URL: &str = "https://api.runpod.io/graphql";
