//! Read-only views over raw control-plane payloads.
//!
//! The service's response shapes are wrapped, not copied: each view borrows
//! nothing and owns its backing [`serde_json::Value`], exposing typed
//! accessors next to raw key access. Missing keys read as `None`; no
//! validation, no defaults.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;

// ─── Status enums ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryStatus {
    Creating,
    Active,
    Failed,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyStatus {
    Creating,
    Active,
    Deleting,
    Failed,
}

impl StrategyStatus {
    /// ACTIVE or FAILED — no further automatic transition will happen.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Active | Self::Failed)
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

// ─── Memory resource ────────────────────────────────────────────────────────

/// A remote memory resource, as returned by the create/get/update calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryView(Value);

impl MemoryView {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id").or_else(|| str_field(&self.0, "memoryId"))
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    pub fn status_str(&self) -> Option<&str> {
        str_field(&self.0, "status")
    }

    pub fn status(&self) -> Option<MemoryStatus> {
        self.status_str()
            .and_then(|s| MemoryStatus::from_str(s).ok())
    }

    pub fn failure_reason(&self) -> Option<&str> {
        str_field(&self.0, "failureReason")
    }

    pub fn description(&self) -> Option<&str> {
        str_field(&self.0, "description")
    }

    pub fn event_expiry_days(&self) -> Option<u64> {
        self.0.get("eventExpiryDuration").and_then(Value::as_u64)
    }

    pub fn execution_role_arn(&self) -> Option<&str> {
        str_field(&self.0, "memoryExecutionRoleArn")
    }

    pub fn encryption_key_arn(&self) -> Option<&str> {
        str_field(&self.0, "encryptionKeyArn")
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        str_field(&self.0, "createdAt").and_then(|s| s.parse().ok())
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        str_field(&self.0, "updatedAt").and_then(|s| s.parse().ok())
    }

    pub fn strategies(&self) -> Vec<StrategyView> {
        self.strategies_raw()
            .iter()
            .map(|s| StrategyView::new(s.clone()))
            .collect()
    }

    /// The strategy list exactly as the service sent it.
    pub fn strategies_raw(&self) -> &[Value] {
        self.0
            .get("strategies")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

// ─── Strategy record ────────────────────────────────────────────────────────

/// One named policy attached to a memory resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyView(Value);

impl StrategyView {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn strategy_id(&self) -> Option<&str> {
        str_field(&self.0, "strategyId").or_else(|| str_field(&self.0, "memoryStrategyId"))
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    pub fn strategy_type(&self) -> Option<&str> {
        str_field(&self.0, "type").or_else(|| str_field(&self.0, "memoryStrategyType"))
    }

    pub fn status_str(&self) -> Option<&str> {
        str_field(&self.0, "status")
    }

    pub fn status(&self) -> Option<StrategyStatus> {
        self.status_str()
            .and_then(|s| StrategyStatus::from_str(s).ok())
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.0
            .get("namespaces")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn configuration(&self) -> Option<&Value> {
        self.0.get("configuration")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// ─── List-result summary ────────────────────────────────────────────────────

/// One entry of a list-memories page. List normalization guarantees both the
/// `id` and `memoryId` spellings are present on the backing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySummary(Value);

impl MemorySummary {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id").or_else(|| str_field(&self.0, "memoryId"))
    }

    pub fn status_str(&self) -> Option<&str> {
        str_field(&self.0, "status")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
