use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    GRAPHQL_API_URL, REST_API_URL,
    error::{Result, RunpodError},
    http_client::http_client,
    types::{CreateEndpointRequest, Endpoint, EndpointMetrics, Template, TemplateSpec, UpdateEndpointRequest},
};

const CREATE_TEMPLATE_MUTATION: &str = r"
mutation createTemplate(
    $containerDiskSize: Int!,
    $env: [KeyValue]!,
    $imageName: String!,
    $name: String!,
    $ports: String,
    $readme: String,
    $volumeInGb: Int,
    $volumeMountPath: String
) {
    createTemplate(
        input: {
            containerDiskSize: $containerDiskSize,
            env: $env,
            imageName: $imageName,
            name: $name,
            ports: $ports,
            readme: $readme,
            volumeInGb: $volumeInGb,
            volumeMountPath: $volumeMountPath
        }
    ) {
        id
        name
        imageName
        env {
            key
            value
        }
        volumeInGb
        volumeMountPath
        containerDiskSize
    }
}
";

const UPDATE_ENDPOINT_MUTATION: &str = r"
mutation updateServerlessEndpoint($input: UpdateServerlessEndpointInput!) {
    updateServerlessEndpoint(input: $input) {
        id
        name
        templateId
        gpuIds
        minWorkers
        maxWorkers
        idleTimeout
        flashBoot
    }
}
";

const TERMINATE_ENDPOINT_MUTATION: &str = r"
mutation terminateServerlessEndpoint($id: String!) {
    terminateServerlessEndpoint(input: { id: $id }) {
        success
    }
}
";

/// Client for the RunPod management APIs
pub struct ManagementClient {
    http: reqwest::Client,
    api_key: SecretString,
    rest_base: String,
    graphql_url: String,
}

impl ManagementClient {
    /// Create a client using the production RunPod API URLs
    pub fn new(api_key: SecretString) -> Self {
        Self {
            http: http_client(),
            api_key,
            rest_base: REST_API_URL.to_owned(),
            graphql_url: GRAPHQL_API_URL.to_owned(),
        }
    }

    /// Override the REST base URL (used by tests against a mock server)
    #[must_use]
    pub fn with_rest_base(mut self, base: impl Into<String>) -> Self {
        self.rest_base = base.into();
        self
    }

    /// Override the GraphQL URL (used by tests against a mock server)
    #[must_use]
    pub fn with_graphql_url(mut self, url: impl Into<String>) -> Self {
        self.graphql_url = url.into();
        self
    }

    /// Create a serverless endpoint
    pub async fn create_endpoint(&self, request: &CreateEndpointRequest) -> Result<Endpoint> {
        tracing::info!(name = %request.name, template_id = %request.template_id, "creating endpoint");

        let url = format!("{}/endpoints", self.rest_base);
        let response = self.authorized(self.http.post(&url)).json(request).send().await?;
        let body = Self::check_rest(response).await?;

        decode_endpoint(body)
    }

    /// Fetch a serverless endpoint's details
    pub async fn get_endpoint(&self, endpoint_id: &str) -> Result<Endpoint> {
        let url = format!("{}/endpoints/{endpoint_id}", self.rest_base);
        let response = self.authorized(self.http.get(&url)).send().await?;
        let body = Self::check_rest(response).await?;

        decode_endpoint(body)
    }

    /// Fetch rolling metrics for an endpoint
    pub async fn get_metrics(&self, endpoint_id: &str) -> Result<EndpointMetrics> {
        let url = format!("{}/endpoints/{endpoint_id}/metrics", self.rest_base);
        let response = self.authorized(self.http.get(&url)).send().await?;
        let body = Self::check_rest(response).await?;

        Ok(serde_json::from_value(normalize(body))?)
    }

    /// Delete a template
    ///
    /// The REST API answers 204 on success.
    pub async fn delete_template(&self, template_id: &str) -> Result<()> {
        tracing::info!(template_id, "deleting template");

        let url = format!("{}/templates/{template_id}", self.rest_base);
        let response = self.authorized(self.http.delete(&url)).send().await?;
        Self::check_rest(response).await.map(|_| ())
    }

    /// Create a template via the createTemplate mutation
    pub async fn create_template(&self, spec: &TemplateSpec) -> Result<Template> {
        tracing::info!(name = %spec.name, image = %spec.image_name, "creating template");

        let variables = serde_json::to_value(spec)?;
        let data = self.graphql(CREATE_TEMPLATE_MUTATION, variables).await?;

        let template = data
            .get("createTemplate")
            .cloned()
            .ok_or(RunpodError::MissingField("createTemplate"))?;

        Ok(serde_json::from_value(template)?)
    }

    /// Update worker limits or GPU types on an existing endpoint
    pub async fn update_endpoint(&self, endpoint_id: &str, update: &UpdateEndpointRequest) -> Result<Endpoint> {
        tracing::info!(endpoint_id, "updating endpoint");

        let mut input = serde_json::to_value(update)?;
        if let Some(map) = input.as_object_mut() {
            map.insert("id".to_owned(), Value::String(endpoint_id.to_owned()));
        }

        let data = self
            .graphql(UPDATE_ENDPOINT_MUTATION, json!({ "input": input }))
            .await?;

        let endpoint = data
            .get("updateServerlessEndpoint")
            .cloned()
            .ok_or(RunpodError::MissingField("updateServerlessEndpoint"))?;

        Ok(serde_json::from_value(endpoint)?)
    }

    /// Terminate a serverless endpoint
    pub async fn delete_endpoint(&self, endpoint_id: &str) -> Result<()> {
        tracing::info!(endpoint_id, "terminating endpoint");

        let data = self
            .graphql(TERMINATE_ENDPOINT_MUTATION, json!({ "id": endpoint_id }))
            .await?;

        let success = data
            .pointer("/terminateServerlessEndpoint/success")
            .and_then(Value::as_bool)
            .ok_or(RunpodError::MissingField("terminateServerlessEndpoint.success"))?;

        if success {
            Ok(())
        } else {
            Err(RunpodError::GraphQl("termination reported failure".to_owned()))
        }
    }

    /// Execute a GraphQL operation, returning the `data` object
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct GraphQlError {
            message: String,
        }

        #[derive(Deserialize)]
        struct GraphQlResponse {
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            errors: Option<Vec<GraphQlError>>,
        }

        let response = self
            .authorized(self.http.post(&self.graphql_url))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RunpodError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let parsed: GraphQlResponse = response.json().await?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(RunpodError::GraphQl(messages.join("; ")));
        }

        parsed.data.ok_or(RunpodError::MissingField("data"))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
    }

    /// Check a REST response, returning the parsed body on success
    async fn check_rest(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "RunPod API request failed");
            return Err(RunpodError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Some REST routes answer with a single-element array instead of an object
fn normalize(body: Value) -> Value {
    match body {
        Value::Array(mut items) if !items.is_empty() => items.remove(0),
        other => other,
    }
}

fn decode_endpoint(body: Value) -> Result<Endpoint> {
    let body = normalize(body);
    if body.get("id").is_none() {
        return Err(RunpodError::MissingField("id"));
    }
    Ok(serde_json::from_value(body)?)
}

/// Pull a human-readable message out of the assorted error body shapes
/// the two APIs produce
fn extract_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return if body.is_empty() { "unknown error".to_owned() } else { body.to_owned() };
    };

    let candidate = match &parsed {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };

    for key in ["message", "error"] {
        if let Some(message) = candidate.get(key).and_then(Value::as_str) {
            return message.to_owned();
        }
    }

    if let Some(errors) = candidate.get("errors") {
        return errors.to_string();
    }

    body.to_owned()
}
