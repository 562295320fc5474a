//! The remote control-plane boundary.
//!
//! [`ControlPlane`] is the explicit allow-list of remote operations this
//! crate needs — one typed method per call, nothing else of the service's
//! surface leaks through. [`HttpControlPlane`] is the production
//! implementation; tests substitute scripted fakes.

mod http;

pub use http::HttpControlPlane;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Request inputs ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Days short-term events are retained before expiry.
    pub event_expiry_duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_execution_role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key_arn: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memory_strategies: Vec<Value>,
    pub client_token: String,
}

/// The nested mutation block of an update call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyMutations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_memory_strategies: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_memory_strategies: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_memory_strategies: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoryInput {
    /// Routed in the URL, not the body.
    #[serde(skip)]
    pub memory_id: String,
    pub memory_strategies: StrategyMutations,
    pub client_token: String,
}

/// One page of a list call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMemoriesPage {
    #[serde(default)]
    pub memories: Vec<Value>,
    #[serde(default)]
    pub next_token: Option<String>,
}

// ─── The seam ───────────────────────────────────────────────────────────────

/// The subset of the control-plane API this crate is allowed to call.
///
/// Create / update / get return the raw memory payload (already unwrapped
/// from the service's `{"memory": …}` envelope); the caller decides how to
/// view it. Every error a method returns is either a
/// [`crate::ServiceError`] carrying the service's own code verbatim or a
/// transport/decoding failure — implementations never reinterpret service
/// errors.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn create_memory(&self, input: &CreateMemoryInput) -> Result<Value>;

    async fn get_memory(&self, memory_id: &str) -> Result<Value>;

    async fn list_memories(
        &self,
        max_results: u32,
        next_token: Option<&str>,
    ) -> Result<ListMemoriesPage>;

    async fn update_memory(&self, input: &UpdateMemoryInput) -> Result<Value>;

    async fn delete_memory(&self, memory_id: &str, client_token: &str) -> Result<Value>;
}
