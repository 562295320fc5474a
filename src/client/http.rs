use super::{ControlPlane, CreateMemoryInput, ListMemoriesPage, UpdateMemoryInput};
use crate::error::{MemoryError, Result, ServiceError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// HTTP implementation of the control plane.
///
/// One reqwest client with explicit connect/request timeouts, a cached base
/// URL, and an optional pre-computed bearer header — transport-level
/// timeouts here are independent of the manager's wait budgets.
pub struct HttpControlPlane {
    client: Client,
    base_url: String,
    cached_auth: Option<String>,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cached_auth: None,
        }
    }

    /// Standard regional endpoint of the agent-hosting service.
    pub fn for_region(region: &str) -> Self {
        Self::new(format!("https://agent-memory.{region}.api.agentmesh.dev"))
    }

    pub fn with_auth_token(mut self, token: impl AsRef<str>) -> Self {
        self.cached_auth = Some(format!("Bearer {}", token.as_ref()));
        self
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cached_auth {
            Some(auth) => builder.header("authorization", auth),
            None => builder,
        }
    }

    /// Decode a response, converting non-2xx into a [`ServiceError`] that
    /// preserves the service's error code verbatim.
    async fn decode(response: Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(MemoryError::from);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        let code = parsed
            .as_ref()
            .and_then(|v| {
                v.get("code")
                    .or_else(|| v.get("__type"))
                    .and_then(Value::as_str)
            })
            // Some gateways prefix the code with its namespace.
            .map(|c| c.rsplit('#').next().unwrap_or(c).to_string())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("UnknownError")
                    .replace(' ', "")
            });
        let message = parsed
            .as_ref()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("Message"))
                    .and_then(Value::as_str)
            })
            .map_or(body, ToString::to_string);

        Err(ServiceError {
            status: status.as_u16(),
            code,
            message,
        }
        .into())
    }

    /// Unwrap the `{"memory": …}` envelope of create/get/update responses.
    fn unwrap_memory(payload: Value) -> Value {
        match payload {
            Value::Object(mut map) => map.remove("memory").unwrap_or(Value::Object(map)),
            other => other,
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_memory(&self, input: &CreateMemoryInput) -> Result<Value> {
        tracing::debug!(name = %input.name, "create_memory");
        let response = self
            .request(self.client.post(format!("{}/memories", self.base_url)))
            .json(input)
            .send()
            .await?;
        Self::decode(response).await.map(Self::unwrap_memory)
    }

    async fn get_memory(&self, memory_id: &str) -> Result<Value> {
        let response = self
            .request(
                self.client
                    .get(format!("{}/memories/{memory_id}", self.base_url)),
            )
            .send()
            .await?;
        Self::decode(response).await.map(Self::unwrap_memory)
    }

    async fn list_memories(
        &self,
        max_results: u32,
        next_token: Option<&str>,
    ) -> Result<ListMemoriesPage> {
        let mut request = self
            .request(self.client.get(format!("{}/memories", self.base_url)))
            .query(&[("maxResults", max_results.to_string())]);
        if let Some(token) = next_token {
            request = request.query(&[("nextToken", token)]);
        }
        let payload = Self::decode(request.send().await?).await?;
        serde_json::from_value(payload).map_err(MemoryError::from)
    }

    async fn update_memory(&self, input: &UpdateMemoryInput) -> Result<Value> {
        tracing::debug!(memory_id = %input.memory_id, "update_memory");
        let response = self
            .request(self.client.post(format!(
                "{}/memories/{}/update",
                self.base_url, input.memory_id
            )))
            .json(input)
            .send()
            .await?;
        Self::decode(response).await.map(Self::unwrap_memory)
    }

    async fn delete_memory(&self, memory_id: &str, client_token: &str) -> Result<Value> {
        tracing::debug!(memory_id, "delete_memory");
        let response = self
            .request(
                self.client
                    .delete(format!("{}/memories/{memory_id}", self.base_url)),
            )
            .query(&[("clientToken", client_token)])
            .send()
            .await?;
        Self::decode(response).await
    }
}
