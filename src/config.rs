//! The memory record persisted in the surrounding project configuration.
//!
//! The project-config file itself (name, schema, location) belongs to the
//! toolkit layer; this crate only produces and consumes the values.

use crate::constants::DEFAULT_EVENT_EXPIRY_DAYS;
use serde::{Deserialize, Serialize};

/// How much memory infrastructure an agent deployment gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryMode {
    /// Short-term memory only: a resource with no strategies.
    StmOnly,
    /// Short- and long-term memory: a resource with extraction strategies.
    StmAndLtm,
    /// No memory resource at all.
    NoMemory,
}

/// The `memory` sub-record of the project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub mode: MemoryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_name: Option<String>,
    #[serde(default = "default_event_expiry_days")]
    pub event_expiry_days: u32,
}

fn default_event_expiry_days() -> u32 {
    DEFAULT_EVENT_EXPIRY_DAYS
}

impl MemoryConfig {
    pub fn disabled() -> Self {
        Self {
            mode: MemoryMode::NoMemory,
            memory_id: None,
            memory_name: None,
            event_expiry_days: DEFAULT_EVENT_EXPIRY_DAYS,
        }
    }

    /// Record for a provisioned resource.
    pub fn provisioned(
        mode: MemoryMode,
        memory_id: impl Into<String>,
        memory_name: impl Into<String>,
        event_expiry_days: u32,
    ) -> Self {
        Self {
            mode,
            memory_id: Some(memory_id.into()),
            memory_name: Some(memory_name.into()),
            event_expiry_days,
        }
    }
}
