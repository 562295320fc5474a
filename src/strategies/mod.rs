//! Typed memory strategies and their wire representation.
//!
//! Each strategy kind is an immutable value object built once by the caller
//! and serialized to the single-key request dictionary the control plane
//! expects (`semanticMemoryStrategy`, `customMemoryStrategy`, …).
//! Serialization is sparse: an unset optional field is omitted, never sent
//! as null.

use crate::constants::{
    DEFAULT_HISTORICAL_CONTEXT_WINDOW, OVERRIDE_KEY_SEMANTIC, OVERRIDE_KEY_SUMMARY,
    OVERRIDE_KEY_USER_PREFERENCE, SELF_MANAGED_KEY, WIRE_CUSTOM, WIRE_SEMANTIC, WIRE_SUMMARY,
    WIRE_USER_PREFERENCE,
};
use crate::error::{MemoryError, Result};
use serde::Serialize;
use serde_json::{Value, json};

// ─── Sub-configuration value objects ────────────────────────────────────────

/// Extraction override: custom prompt and/or model for pulling memories out
/// of conversation turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_to_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ExtractionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_to_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_to_prompt = Some(prompt.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// Consolidation override: custom prompt and/or model for merging extracted
/// memories into their namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_to_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ConsolidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_to_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_to_prompt = Some(prompt.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// When a self-managed strategy hands a batch of conversation history to the
/// caller's own pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCondition {
    /// Fire after this many new messages.
    MessageCount(u32),
    /// Fire once the unprocessed history reaches this many tokens.
    TokenCount(u32),
    /// Fire after a session has been idle this many seconds.
    IdleTimeout(u32),
}

impl TriggerCondition {
    fn to_wire(self) -> Value {
        match self {
            Self::MessageCount(count) => json!({"messageBasedTrigger": {"messageCount": count}}),
            Self::TokenCount(count) => json!({"tokenBasedTrigger": {"tokenCount": count}}),
            Self::IdleTimeout(secs) => {
                json!({"timeBasedTrigger": {"idleSessionTimeout": secs}})
            }
        }
    }
}

/// Where a self-managed strategy delivers its batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationConfig {
    pub topic_arn: String,
    pub payload_delivery_bucket_name: String,
}

impl InvocationConfig {
    pub fn new(topic_arn: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            payload_delivery_bucket_name: bucket_name.into(),
        }
    }
}

// ─── Strategy variants ──────────────────────────────────────────────────────

macro_rules! base_builders {
    ($ty:ident) => {
        impl $ty {
            pub fn with_description(mut self, description: impl Into<String>) -> Self {
                self.description = Some(description.into());
                self
            }

            pub fn with_namespaces(
                mut self,
                namespaces: impl IntoIterator<Item = impl Into<String>>,
            ) -> Self {
                self.namespaces = Some(namespaces.into_iter().map(Into::into).collect());
                self
            }
        }
    };
}

/// Built-in semantic extraction (facts and knowledge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
}

impl SemanticStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
        }
    }
}
base_builders!(SemanticStrategy);

/// Built-in session summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
}

impl SummaryStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
        }
    }
}
base_builders!(SummaryStrategy);

/// Built-in user-preference extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferenceStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
}

impl UserPreferenceStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
        }
    }
}
base_builders!(UserPreferenceStrategy);

/// Semantic extraction with caller-supplied prompts/models.
///
/// Both sub-configs are required constructor arguments; a custom semantic
/// strategy without one of them is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSemanticStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub extraction: ExtractionConfig,
    pub consolidation: ConsolidationConfig,
}

impl CustomSemanticStrategy {
    pub fn new(
        name: impl Into<String>,
        extraction: ExtractionConfig,
        consolidation: ConsolidationConfig,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
            extraction,
            consolidation,
        }
    }
}
base_builders!(CustomSemanticStrategy);

/// Summarization with a caller-supplied consolidation prompt/model. Summary
/// overrides have no extraction phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSummaryStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub consolidation: ConsolidationConfig,
}

impl CustomSummaryStrategy {
    pub fn new(name: impl Into<String>, consolidation: ConsolidationConfig) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
            consolidation,
        }
    }
}
base_builders!(CustomSummaryStrategy);

/// User-preference extraction with caller-supplied prompts/models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomUserPreferenceStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub extraction: ExtractionConfig,
    pub consolidation: ConsolidationConfig,
}

impl CustomUserPreferenceStrategy {
    pub fn new(
        name: impl Into<String>,
        extraction: ExtractionConfig,
        consolidation: ConsolidationConfig,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
            extraction,
            consolidation,
        }
    }
}
base_builders!(CustomUserPreferenceStrategy);

/// Long-term memory managed by the caller's own pipeline: the service only
/// batches history per the trigger conditions and delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfManagedStrategy {
    pub name: String,
    pub description: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub trigger_conditions: Vec<TriggerCondition>,
    pub invocation: InvocationConfig,
    pub historical_context_window_size: u32,
}

impl SelfManagedStrategy {
    pub fn new(
        name: impl Into<String>,
        trigger_conditions: Vec<TriggerCondition>,
        invocation: InvocationConfig,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            namespaces: None,
            trigger_conditions,
            invocation,
            historical_context_window_size: DEFAULT_HISTORICAL_CONTEXT_WINDOW,
        }
    }

    pub fn with_historical_context_window(mut self, size: u32) -> Self {
        self.historical_context_window_size = size;
        self
    }
}
base_builders!(SelfManagedStrategy);

// ─── Sum type + wire conversion ─────────────────────────────────────────────

/// Any typed strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategySpec {
    Semantic(SemanticStrategy),
    Summary(SummaryStrategy),
    UserPreference(UserPreferenceStrategy),
    CustomSemantic(CustomSemanticStrategy),
    CustomSummary(CustomSummaryStrategy),
    CustomUserPreference(CustomUserPreferenceStrategy),
    SelfManaged(SelfManagedStrategy),
}

fn base_body(name: &str, description: Option<&str>, namespaces: Option<&[String]>) -> Value {
    let mut body = json!({"name": name});
    if let Some(description) = description {
        body["description"] = json!(description);
    }
    if let Some(namespaces) = namespaces {
        body["namespaces"] = json!(namespaces);
    }
    body
}

fn override_body(
    base: Value,
    override_key: &str,
    extraction: Option<&ExtractionConfig>,
    consolidation: &ConsolidationConfig,
) -> Value {
    let mut body = base;
    let mut inner = serde_json::Map::new();
    if let Some(extraction) = extraction {
        inner.insert("extraction".into(), json!(extraction));
    }
    inner.insert("consolidation".into(), json!(consolidation));
    body["configuration"] = json!({ override_key: Value::Object(inner) });
    body
}

impl StrategySpec {
    /// The single-key request dictionary the control plane expects.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Semantic(s) => json!({
                WIRE_SEMANTIC: base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref())
            }),
            Self::Summary(s) => json!({
                WIRE_SUMMARY: base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref())
            }),
            Self::UserPreference(s) => json!({
                WIRE_USER_PREFERENCE:
                    base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref())
            }),
            Self::CustomSemantic(s) => json!({
                WIRE_CUSTOM: override_body(
                    base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref()),
                    OVERRIDE_KEY_SEMANTIC,
                    Some(&s.extraction),
                    &s.consolidation,
                )
            }),
            Self::CustomSummary(s) => json!({
                WIRE_CUSTOM: override_body(
                    base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref()),
                    OVERRIDE_KEY_SUMMARY,
                    None,
                    &s.consolidation,
                )
            }),
            Self::CustomUserPreference(s) => json!({
                WIRE_CUSTOM: override_body(
                    base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref()),
                    OVERRIDE_KEY_USER_PREFERENCE,
                    Some(&s.extraction),
                    &s.consolidation,
                )
            }),
            Self::SelfManaged(s) => {
                let mut body =
                    base_body(&s.name, s.description.as_deref(), s.namespaces.as_deref());
                body["configuration"] = json!({
                    SELF_MANAGED_KEY: {
                        "triggerConditions": s.trigger_conditions
                            .iter()
                            .map(|t| t.to_wire())
                            .collect::<Vec<_>>(),
                        "invocationConfiguration": &s.invocation,
                        "historicalContextWindowSize": s.historical_context_window_size,
                    }
                });
                json!({ WIRE_CUSTOM: body })
            }
        }
    }
}

macro_rules! spec_from {
    ($ty:ident => $variant:ident) => {
        impl From<$ty> for StrategySpec {
            fn from(s: $ty) -> Self {
                Self::$variant(s)
            }
        }
        impl From<$ty> for StrategyInput {
            fn from(s: $ty) -> Self {
                Self::Spec(StrategySpec::$variant(s))
            }
        }
    };
}

spec_from!(SemanticStrategy => Semantic);
spec_from!(SummaryStrategy => Summary);
spec_from!(UserPreferenceStrategy => UserPreference);
spec_from!(CustomSemanticStrategy => CustomSemantic);
spec_from!(CustomSummaryStrategy => CustomSummary);
spec_from!(CustomUserPreferenceStrategy => CustomUserPreference);
spec_from!(SelfManagedStrategy => SelfManaged);

/// A strategy as accepted at the API boundary: either a typed spec or a
/// caller-supplied raw wire dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyInput {
    Spec(StrategySpec),
    Raw(Value),
}

impl From<StrategySpec> for StrategyInput {
    fn from(spec: StrategySpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Value> for StrategyInput {
    fn from(raw: Value) -> Self {
        Self::Raw(raw)
    }
}

/// Normalize a mixed list of typed specs and raw wire dictionaries to the
/// wire format. The single conversion point for every request path.
pub fn strategies_to_wire(inputs: &[StrategyInput]) -> Result<Vec<Value>> {
    inputs
        .iter()
        .map(|input| match input {
            StrategyInput::Spec(spec) => Ok(spec.to_wire()),
            StrategyInput::Raw(raw) if raw.is_object() => Ok(raw.clone()),
            StrategyInput::Raw(raw) => Err(MemoryError::Validation(format!(
                "raw strategy must be a JSON object, got {raw}"
            ))),
        })
        .collect()
}
