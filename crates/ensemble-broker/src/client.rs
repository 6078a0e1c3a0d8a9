//! HTTP client for the broker.
//!
//! Two outbound calls: announce an agent to the catalog, and submit a new
//! top-level task. Both share one `reqwest` client with an explicit request
//! timeout; retries belong to the caller.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ensemble_api::AgentTaskRequest;

use crate::model::{AgentDefinition, TaskSubmitAck};

const CORRELATION_HEADER: &str = "x-correlation-id";
/// Marker correlation id on catalog registrations.
const REGISTRATION_CID: &str = "agent-registration";

/// Broker call errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("http error: {0}")]
    Http(String),
    #[error("broker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response decode error: {0}")]
    Decode(String),
}

/// Broker client configuration.
#[derive(Debug, Clone)]
pub struct BrokerClientConfig {
    /// Broker base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token for task submission; omitted when `None`.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BrokerClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Client for the broker's catalog and task-submission endpoints.
pub struct BrokerClient {
    client: reqwest::Client,
    config: BrokerClientConfig,
}

impl BrokerClient {
    pub fn new(config: BrokerClientConfig) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn catalog_url(&self) -> String {
        format!(
            "{}/catalog/agents",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.config.base_url.trim_end_matches('/'))
    }

    /// Upsert one agent definition into the broker catalog.
    ///
    /// Returns the broker's modification count; 0 means the stored
    /// definition was already current.
    pub async fn register_agent(&self, definition: &AgentDefinition) -> Result<u64, BrokerError> {
        let url = self.catalog_url();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            CORRELATION_HEADER,
            HeaderValue::from_static(REGISTRATION_CID),
        );

        tracing::info!(
            agent = %definition.name,
            task_id = %definition.task_id,
            url = %url,
            "registering agent with broker"
        );

        let response = self
            .client
            .put(&url)
            .headers(headers)
            .json(&RegisterAgentBody {
                agent_definition: definition,
            })
            .send()
            .await
            .map_err(|e| BrokerError::Http(e.to_string()))?;

        let ack: RegisterAgentAck = decode_response(response).await?;
        tracing::info!(
            agent = %definition.name,
            modified_count = ack.modified_count,
            "agent registration acknowledged"
        );
        Ok(ack.modified_count)
    }

    /// Submit a new top-level task to the broker.
    ///
    /// The request's correlation id rides along as `x-correlation-id`; a
    /// fresh UUID is generated when the request carries none.
    pub async fn submit_task(
        &self,
        request: &AgentTaskRequest,
    ) -> Result<TaskSubmitAck, BrokerError> {
        let url = self.tasks_url();
        let cid = match &request.correlation_id {
            Some(cid) => cid.clone(),
            None => Uuid::new_v4().to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            CORRELATION_HEADER,
            HeaderValue::from_str(&cid).map_err(|e| BrokerError::Http(e.to_string()))?,
        );
        if let Some(token) = &self.config.token {
            let value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|e| BrokerError::Http(e.to_string()))?,
            );
        }

        tracing::info!(
            task_id = %request.task_id,
            correlation_id = %cid,
            url = %url,
            "submitting task to broker"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| BrokerError::Http(e.to_string()))?;

        let ack: TaskSubmitAck = decode_response(response).await?;
        tracing::info!(
            task_id = %ack.task_id,
            task_execution_id = %ack.task_execution_id,
            "task accepted by broker"
        );
        Ok(ack)
    }
}

// Broker request/response structures

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterAgentBody<'a> {
    agent_definition: &'a AgentDefinition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterAgentAck {
    modified_count: u64,
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BrokerError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(BrokerError::Status { status, body });
    }

    let text = response
        .text()
        .await
        .map_err(|e| BrokerError::Http(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| BrokerError::Decode(e.to_string()))
}
