//! The memory lifecycle manager.
//!
//! The only component that talks to the control plane. Owns creation,
//! retrieval, listing, strategy mutation, and deletion of memory resources,
//! plus the poll loops that bridge the service's asynchronous provisioning
//! model to a synchronous caller. Nothing here retries automatically; the
//! only loops are the explicit, caller-visible `_and_wait` polls.

use crate::client::{
    ControlPlane, CreateMemoryInput, HttpControlPlane, StrategyMutations, UpdateMemoryInput,
};
use crate::constants::{
    BUILTIN_CONSOLIDATION_WRAPPERS, BUILTIN_EXTRACTION_WRAPPERS, CONSOLIDATION_OVERRIDE_KEYS,
    CUSTOM_CONSOLIDATION_WRAPPER, CUSTOM_EXTRACTION_WRAPPER, DEFAULT_EVENT_EXPIRY_DAYS,
    DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, EXTRACTION_OVERRIDE_KEYS, LIST_PAGE_CAP,
    PROGRESS_CADENCE, TYPE_CUSTOM, lookup,
};
use crate::error::{MemoryError, Result};
use crate::reconcile::validate_existing_memory_strategies;
use crate::strategies::{
    ConsolidationConfig, CustomSemanticStrategy, ExtractionConfig, SemanticStrategy, StrategyInput,
    SummaryStrategy, UserPreferenceStrategy, strategies_to_wire,
};
use crate::views::{MemoryStatus, MemorySummary, MemoryView, StrategyStatus, StrategyView};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

// ─── Call parameters ────────────────────────────────────────────────────────

/// Everything a create (or get-or-create) call needs.
#[derive(Debug, Clone)]
pub struct CreateMemoryParams {
    pub name: String,
    pub strategies: Vec<StrategyInput>,
    pub description: Option<String>,
    pub event_expiry_days: u32,
    pub execution_role_arn: Option<String>,
    pub encryption_key_arn: Option<String>,
}

impl CreateMemoryParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
            description: None,
            event_expiry_days: DEFAULT_EVENT_EXPIRY_DAYS,
            execution_role_arn: None,
            encryption_key_arn: None,
        }
    }

    pub fn strategy(mut self, strategy: impl Into<StrategyInput>) -> Self {
        self.strategies.push(strategy.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn event_expiry_days(mut self, days: u32) -> Self {
        self.event_expiry_days = days;
        self
    }

    pub fn execution_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.execution_role_arn = Some(arn.into());
        self
    }

    pub fn encryption_key_arn(mut self, arn: impl Into<String>) -> Self {
        self.encryption_key_arn = Some(arn.into());
        self
    }
}

/// Wall-clock budget and cadence for a wait loop.
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn new(max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            max_wait,
            poll_interval,
        }
    }
}

/// The three mutation kinds of an update call. At least one must be
/// non-empty; a zero-operation update is rejected before any remote call.
#[derive(Debug, Clone, Default)]
pub struct StrategyUpdates {
    pub add: Vec<StrategyInput>,
    pub modify: Vec<Value>,
    pub delete_ids: Vec<String>,
}

impl StrategyUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, strategy: impl Into<StrategyInput>) -> Self {
        self.add.push(strategy.into());
        self
    }

    /// A modify entry must carry `strategyId`; its optional `configuration`
    /// block uses plain `extraction`/`consolidation` keys and is re-wrapped
    /// into the service shape by the manager.
    pub fn modify(mut self, entry: Value) -> Self {
        self.modify.push(entry);
        self
    }

    pub fn delete(mut self, strategy_id: impl Into<String>) -> Self {
        self.delete_ids.push(strategy_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.delete_ids.is_empty()
    }
}

// ─── Progress reporting ─────────────────────────────────────────────────────

/// What a wait loop is seeing. Emitted through [`ProgressReporter`] so tests
/// and embedding UIs observe progress without capturing log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitEvent {
    Polling {
        memory_id: String,
        status: String,
        active_strategies: usize,
        total_strategies: usize,
        elapsed: Duration,
    },
    Ready {
        memory_id: String,
        elapsed: Duration,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &WaitEvent);
}

/// Default reporter: structured `tracing` lines.
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &WaitEvent) {
        match event {
            WaitEvent::Polling {
                memory_id,
                status,
                active_strategies,
                total_strategies,
                elapsed,
            } => tracing::info!(
                memory_id = %memory_id,
                status = %status,
                strategies = format!("{active_strategies}/{total_strategies} active"),
                elapsed_secs = elapsed.as_secs(),
                "Waiting for memory to stabilize"
            ),
            WaitEvent::Ready { memory_id, elapsed } => tracing::info!(
                memory_id = %memory_id,
                elapsed_secs = elapsed.as_secs(),
                "Memory is ACTIVE"
            ),
        }
    }
}

/// Outcome of one post-delete probe. "Not found" is the success signal of
/// deletion, mapped here once rather than matched on inline.
enum DeleteProbe {
    Completed,
    StillExists(String),
}

// ─── The manager ────────────────────────────────────────────────────────────

pub struct MemoryManager {
    client: Arc<dyn ControlPlane>,
    reporter: Arc<dyn ProgressReporter>,
}

impl MemoryManager {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self {
            client,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(client: Arc<dyn ControlPlane>, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { client, reporter }
    }

    /// Manager over the standard regional endpoint.
    pub fn for_region(region: &str) -> Self {
        Self::new(Arc::new(HttpControlPlane::for_region(region)))
    }

    fn fresh_token() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // ── Create ──────────────────────────────────────────────────────────

    /// One create call with a fresh idempotency token. Returns immediately;
    /// the resource will still be CREATING.
    pub async fn create_memory(&self, params: &CreateMemoryParams) -> Result<MemoryView> {
        let input = CreateMemoryInput {
            name: params.name.clone(),
            description: params.description.clone(),
            event_expiry_duration: params.event_expiry_days,
            memory_execution_role_arn: params.execution_role_arn.clone(),
            encryption_key_arn: params.encryption_key_arn.clone(),
            memory_strategies: strategies_to_wire(&params.strategies)?,
            client_token: Self::fresh_token(),
        };
        let memory = MemoryView::new(self.client.create_memory(&input).await?);
        tracing::info!(
            memory_id = memory.id().unwrap_or("<unknown>"),
            name = %params.name,
            "Created memory"
        );
        Ok(memory)
    }

    pub async fn create_memory_and_wait(
        &self,
        params: &CreateMemoryParams,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        let memory = self.create_memory(params).await?;
        let memory_id = Self::required_id(&memory)?;
        self.wait_for_memory_active(&memory_id, wait).await
    }

    /// Reuse a memory matching `params.name` if one exists, else create one
    /// and wait for it.
    ///
    /// Matching relies on the service's id convention of appending a random
    /// suffix to the requested name (`"{name}-…"`). If that convention ever
    /// changes, the lookup misses and a duplicate resource gets created —
    /// a documented limitation, by service contract.
    ///
    /// When the caller supplied strategies, an existing resource is only
    /// reused if its strategies structurally match the requested set;
    /// a mismatch is a hard error, never a silent mutation.
    pub async fn get_or_create_memory(
        &self,
        params: &CreateMemoryParams,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        let prefix = format!("{}-", params.name);
        let summaries = self.list_memories(LIST_PAGE_CAP).await?;
        let matched = summaries.iter().find_map(|summary| {
            summary
                .id()
                .filter(|id| id.starts_with(&prefix))
                .map(ToString::to_string)
        });

        if let Some(memory_id) = matched {
            let memory = self.get_memory(&memory_id).await?;
            if !params.strategies.is_empty() {
                let requested = strategies_to_wire(&params.strategies)?;
                validate_existing_memory_strategies(
                    memory.strategies_raw(),
                    &requested,
                    &params.name,
                )?;
            }
            tracing::info!(memory_id = %memory_id, name = %params.name, "Reusing existing memory");
            return Ok(memory);
        }

        self.create_memory_and_wait(params, wait).await
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub async fn get_memory(&self, memory_id: &str) -> Result<MemoryView> {
        Ok(MemoryView::new(self.client.get_memory(memory_id).await?))
    }

    pub async fn get_memory_status(&self, memory_id: &str) -> Result<MemoryStatus> {
        let memory = self.get_memory(memory_id).await?;
        memory.status().ok_or_else(|| {
            MemoryError::Payload(format!(
                "memory {memory_id} has unrecognized status {:?}",
                memory.status_str()
            ))
        })
    }

    pub async fn get_memory_strategies(&self, memory_id: &str) -> Result<Vec<StrategyView>> {
        Ok(self.get_memory(memory_id).await?.strategies())
    }

    /// List memories, paginating transparently up to `max_results`. Each
    /// page asks for `min(remaining, 100)` (the service's page cap); both
    /// historical id spellings are guaranteed present on every summary.
    pub async fn list_memories(&self, max_results: u32) -> Result<Vec<MemorySummary>> {
        let mut collected: Vec<MemorySummary> = Vec::new();
        let mut next_token: Option<String> = None;

        while (collected.len() as u32) < max_results {
            let remaining = max_results - collected.len() as u32;
            let page = self
                .client
                .list_memories(remaining.min(LIST_PAGE_CAP), next_token.as_deref())
                .await?;
            for mut raw in page.memories {
                normalize_summary_ids(&mut raw);
                collected.push(MemorySummary::new(raw));
            }
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }
        Ok(collected)
    }

    // ── Strategy mutation ───────────────────────────────────────────────

    /// General-purpose mutation entrypoint: add, modify, and/or delete
    /// strategies in one update call.
    ///
    /// Mutating strategies transiently takes the whole resource out of
    /// ACTIVE; use [`Self::update_memory_strategies_and_wait`] to block
    /// until it returns.
    pub async fn update_memory_strategies(
        &self,
        memory_id: &str,
        updates: &StrategyUpdates,
    ) -> Result<MemoryView> {
        if updates.is_empty() {
            return Err(MemoryError::Validation(
                "update_memory_strategies requires at least one of add, modify, or delete".into(),
            ));
        }

        let mut mutations = StrategyMutations::default();
        if !updates.add.is_empty() {
            mutations.add_memory_strategies = Some(strategies_to_wire(&updates.add)?);
        }
        if !updates.modify.is_empty() {
            let current = self.get_memory_strategies(memory_id).await?;
            let wrapped = updates
                .modify
                .iter()
                .map(|entry| wrap_modify_entry(memory_id, entry, &current))
                .collect::<Result<Vec<_>>>()?;
            mutations.modify_memory_strategies = Some(wrapped);
        }
        if !updates.delete_ids.is_empty() {
            mutations.delete_memory_strategies = Some(
                updates
                    .delete_ids
                    .iter()
                    .map(|id| json!({"memoryStrategyId": id}))
                    .collect(),
            );
        }

        let input = UpdateMemoryInput {
            memory_id: memory_id.to_string(),
            memory_strategies: mutations,
            client_token: Self::fresh_token(),
        };
        let memory = MemoryView::new(self.client.update_memory(&input).await?);
        tracing::info!(
            memory_id,
            added = updates.add.len(),
            modified = updates.modify.len(),
            deleted = updates.delete_ids.len(),
            "Updated memory strategies"
        );
        Ok(memory)
    }

    pub async fn update_memory_strategies_and_wait(
        &self,
        memory_id: &str,
        updates: &StrategyUpdates,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.update_memory_strategies(memory_id, updates).await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    pub async fn add_strategy(
        &self,
        memory_id: &str,
        strategy: impl Into<StrategyInput>,
    ) -> Result<MemoryView> {
        self.update_memory_strategies(memory_id, &StrategyUpdates::new().add(strategy))
            .await
    }

    pub async fn add_strategy_and_wait(
        &self,
        memory_id: &str,
        strategy: impl Into<StrategyInput>,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.add_strategy(memory_id, strategy).await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    pub async fn add_semantic_strategy(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
    ) -> Result<MemoryView> {
        let mut strategy = SemanticStrategy::new(name);
        if let Some(description) = description {
            strategy = strategy.with_description(description);
        }
        if let Some(namespaces) = namespaces {
            strategy = strategy.with_namespaces(namespaces);
        }
        self.add_strategy(memory_id, strategy).await
    }

    pub async fn add_semantic_strategy_and_wait(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.add_semantic_strategy(memory_id, name, description, namespaces)
            .await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    pub async fn add_summary_strategy(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
    ) -> Result<MemoryView> {
        let mut strategy = SummaryStrategy::new(name);
        if let Some(description) = description {
            strategy = strategy.with_description(description);
        }
        if let Some(namespaces) = namespaces {
            strategy = strategy.with_namespaces(namespaces);
        }
        self.add_strategy(memory_id, strategy).await
    }

    pub async fn add_summary_strategy_and_wait(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.add_summary_strategy(memory_id, name, description, namespaces)
            .await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    pub async fn add_user_preference_strategy(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
    ) -> Result<MemoryView> {
        let mut strategy = UserPreferenceStrategy::new(name);
        if let Some(description) = description {
            strategy = strategy.with_description(description);
        }
        if let Some(namespaces) = namespaces {
            strategy = strategy.with_namespaces(namespaces);
        }
        self.add_strategy(memory_id, strategy).await
    }

    pub async fn add_user_preference_strategy_and_wait(
        &self,
        memory_id: &str,
        name: &str,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.add_user_preference_strategy(memory_id, name, description, namespaces)
            .await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    pub async fn add_custom_semantic_strategy(
        &self,
        memory_id: &str,
        name: &str,
        extraction: ExtractionConfig,
        consolidation: ConsolidationConfig,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
    ) -> Result<MemoryView> {
        let mut strategy = CustomSemanticStrategy::new(name, extraction, consolidation);
        if let Some(description) = description {
            strategy = strategy.with_description(description);
        }
        if let Some(namespaces) = namespaces {
            strategy = strategy.with_namespaces(namespaces);
        }
        self.add_strategy(memory_id, strategy).await
    }

    pub async fn add_custom_semantic_strategy_and_wait(
        &self,
        memory_id: &str,
        name: &str,
        extraction: ExtractionConfig,
        consolidation: ConsolidationConfig,
        description: Option<&str>,
        namespaces: Option<Vec<String>>,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        self.add_custom_semantic_strategy(
            memory_id,
            name,
            extraction,
            consolidation,
            description,
            namespaces,
        )
        .await?;
        self.wait_for_memory_active(memory_id, wait).await
    }

    /// Modify one strategy. `modification` uses plain
    /// `description`/`namespaces`/`configuration` keys; the strategy id is
    /// supplied separately.
    pub async fn modify_strategy(
        &self,
        memory_id: &str,
        strategy_id: &str,
        modification: Value,
    ) -> Result<MemoryView> {
        let mut entry = match modification {
            Value::Object(map) => map,
            other => {
                return Err(MemoryError::Validation(format!(
                    "strategy modification must be a JSON object, got {other}"
                )));
            }
        };
        entry.insert("strategyId".into(), json!(strategy_id));
        self.update_memory_strategies(
            memory_id,
            &StrategyUpdates::new().modify(Value::Object(entry)),
        )
        .await
    }

    pub async fn delete_strategy(&self, memory_id: &str, strategy_id: &str) -> Result<MemoryView> {
        self.update_memory_strategies(memory_id, &StrategyUpdates::new().delete(strategy_id))
            .await
    }

    // ── Delete ──────────────────────────────────────────────────────────

    pub async fn delete_memory(&self, memory_id: &str) -> Result<Value> {
        let response = self
            .client
            .delete_memory(memory_id, &Self::fresh_token())
            .await?;
        tracing::info!(memory_id, "Requested memory deletion");
        Ok(response)
    }

    /// Delete, then poll until the resource is gone. "Not found" on a
    /// post-delete get is completion; any other service error propagates.
    /// Returns the original delete response.
    pub async fn delete_memory_and_wait(
        &self,
        memory_id: &str,
        wait: &WaitOptions,
    ) -> Result<Value> {
        let response = self.delete_memory(memory_id).await?;
        let started = Instant::now();
        loop {
            if started.elapsed() >= wait.max_wait {
                return Err(MemoryError::WaitTimeout {
                    memory_id: memory_id.to_string(),
                    max_wait_secs: wait.max_wait.as_secs(),
                });
            }
            match self.probe_deletion(memory_id).await? {
                DeleteProbe::Completed => {
                    tracing::info!(memory_id, "Memory fully deleted");
                    return Ok(response);
                }
                DeleteProbe::StillExists(status) => {
                    tracing::debug!(memory_id, status = %status, "Memory still deleting");
                }
            }
            sleep(wait.poll_interval).await;
        }
    }

    async fn probe_deletion(&self, memory_id: &str) -> Result<DeleteProbe> {
        match self.client.get_memory(memory_id).await {
            Ok(raw) => Ok(DeleteProbe::StillExists(
                MemoryView::new(raw)
                    .status_str()
                    .unwrap_or("UNKNOWN")
                    .to_string(),
            )),
            Err(MemoryError::Service(e)) if e.is_not_found() => Ok(DeleteProbe::Completed),
            Err(other) => Err(other),
        }
    }

    // ── Wait loop ───────────────────────────────────────────────────────

    /// Poll until the resource is ACTIVE and every strategy is terminal.
    ///
    /// A FAILED resource raises immediately — no further polls on a dead
    /// resource. A resource can come up ACTIVE while carrying FAILED
    /// strategies; that is still an error, listing every failed strategy.
    /// The budget is checked at the top of each iteration; progress is
    /// reported at a fixed cadence rather than every poll.
    pub async fn wait_for_memory_active(
        &self,
        memory_id: &str,
        wait: &WaitOptions,
    ) -> Result<MemoryView> {
        let started = Instant::now();
        let mut last_report: Option<Instant> = None;

        loop {
            if started.elapsed() >= wait.max_wait {
                return Err(MemoryError::WaitTimeout {
                    memory_id: memory_id.to_string(),
                    max_wait_secs: wait.max_wait.as_secs(),
                });
            }

            let memory = self.get_memory(memory_id).await?;
            if memory.status() == Some(MemoryStatus::Failed) {
                return Err(MemoryError::ResourceFailed {
                    memory_id: memory_id.to_string(),
                    reason: memory
                        .failure_reason()
                        .unwrap_or("no failure reason reported")
                        .to_string(),
                });
            }

            let strategies = memory.strategies();
            let total = strategies.len();
            let active = strategies
                .iter()
                .filter(|s| s.status() == Some(StrategyStatus::Active))
                .count();
            let all_terminal = strategies
                .iter()
                .all(|s| s.status().is_some_and(StrategyStatus::is_terminal));

            if all_terminal && memory.status() == Some(MemoryStatus::Active) {
                let failed: Vec<String> = strategies
                    .iter()
                    .filter(|s| s.status() == Some(StrategyStatus::Failed))
                    .map(|s| s.name().unwrap_or("<unnamed>").to_string())
                    .collect();
                if !failed.is_empty() {
                    return Err(MemoryError::StrategiesFailed {
                        memory_id: memory_id.to_string(),
                        names: failed,
                    });
                }
                self.reporter.report(&WaitEvent::Ready {
                    memory_id: memory_id.to_string(),
                    elapsed: started.elapsed(),
                });
                return Ok(memory);
            }

            let report_due = last_report.is_none_or(|at| at.elapsed() >= PROGRESS_CADENCE);
            if report_due {
                self.reporter.report(&WaitEvent::Polling {
                    memory_id: memory_id.to_string(),
                    status: memory.status_str().unwrap_or("UNKNOWN").to_string(),
                    active_strategies: active,
                    total_strategies: total,
                    elapsed: started.elapsed(),
                });
                last_report = Some(Instant::now());
            }

            sleep(wait.poll_interval).await;
        }
    }

    fn required_id(memory: &MemoryView) -> Result<String> {
        memory.id().map(ToString::to_string).ok_or_else(|| {
            MemoryError::Payload("service response is missing the memory id".into())
        })
    }
}

// ─── Modify re-wrapping ─────────────────────────────────────────────────────

fn normalize_summary_ids(raw: &mut Value) {
    let Some(map) = raw.as_object_mut() else {
        return;
    };
    if let Some(id) = map.get("id").cloned() {
        map.entry("memoryId").or_insert(id);
    } else if let Some(id) = map.get("memoryId").cloned() {
        map.insert("id".into(), id);
    }
}

/// Turn a caller's modify entry into the service shape: resolve the
/// strategy's type (and override type for CUSTOM) from the resource's
/// current strategies, then wrap any plain `extraction`/`consolidation`
/// blocks under the expected configuration keys.
fn wrap_modify_entry(
    memory_id: &str,
    entry: &Value,
    current: &[StrategyView],
) -> Result<Value> {
    let map = entry.as_object().ok_or_else(|| {
        MemoryError::Validation(format!("modify entry must be a JSON object, got {entry}"))
    })?;

    let strategy_id = map
        .get("strategyId")
        .or_else(|| map.get("memoryStrategyId"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            MemoryError::Validation("modify entry is missing its strategyId".into())
        })?;

    let strategy = current
        .iter()
        .find(|s| s.strategy_id() == Some(strategy_id))
        .ok_or_else(|| {
            MemoryError::Validation(format!(
                "strategy {strategy_id} not found on memory {memory_id}"
            ))
        })?;
    let strategy_type = strategy.strategy_type().unwrap_or_default().to_string();

    let mut wrapped = Map::new();
    wrapped.insert("memoryStrategyId".into(), json!(strategy_id));
    for (key, value) in map {
        match key.as_str() {
            "strategyId" | "memoryStrategyId" => {}
            "configuration" => {
                wrapped.insert(
                    key.clone(),
                    wrap_configuration(value, &strategy_type, strategy)?,
                );
            }
            _ => {
                wrapped.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(wrapped))
}

fn wrap_configuration(
    config: &Value,
    strategy_type: &str,
    strategy: &StrategyView,
) -> Result<Value> {
    let map = config.as_object().ok_or_else(|| {
        MemoryError::Validation(format!(
            "modify configuration must be a JSON object, got {config}"
        ))
    })?;

    let override_type = if strategy_type == TYPE_CUSTOM {
        Some(resolve_override_type(strategy)?)
    } else {
        None
    };

    let mut wrapped = Map::new();
    for (key, value) in map {
        match key.as_str() {
            "extraction" => {
                wrapped.insert(
                    key.clone(),
                    wrap_phase(
                        value,
                        strategy_type,
                        override_type.as_deref(),
                        CUSTOM_EXTRACTION_WRAPPER,
                        &BUILTIN_EXTRACTION_WRAPPERS,
                        &EXTRACTION_OVERRIDE_KEYS,
                    )?,
                );
            }
            "consolidation" => {
                wrapped.insert(
                    key.clone(),
                    wrap_phase(
                        value,
                        strategy_type,
                        override_type.as_deref(),
                        CUSTOM_CONSOLIDATION_WRAPPER,
                        &BUILTIN_CONSOLIDATION_WRAPPERS,
                        &CONSOLIDATION_OVERRIDE_KEYS,
                    )?,
                );
            }
            _ => {
                wrapped.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(wrapped))
}

fn wrap_phase(
    phase_config: &Value,
    strategy_type: &str,
    override_type: Option<&str>,
    custom_wrapper: &str,
    builtin_table: &[(&'static str, &'static str)],
    override_table: &[(&'static str, &'static str)],
) -> Result<Value> {
    if let Some(override_type) = override_type {
        let override_key = lookup(override_table, override_type).ok_or_else(|| {
            MemoryError::Validation(format!(
                "override type {override_type} does not support this modification"
            ))
        })?;
        return Ok(json!({custom_wrapper: {override_key: phase_config}}));
    }
    let builtin_key = lookup(builtin_table, strategy_type).ok_or_else(|| {
        MemoryError::Validation(format!(
            "strategy type {strategy_type} does not support this modification"
        ))
    })?;
    Ok(json!({builtin_key: phase_config}))
}

/// The override type of an existing CUSTOM strategy, from its stored
/// configuration `type` tag, falling back to wrapper-key inspection.
fn resolve_override_type(strategy: &StrategyView) -> Result<String> {
    let config = strategy.configuration().and_then(Value::as_object);
    if let Some(tag) = config
        .and_then(|c| c.get("type"))
        .and_then(Value::as_str)
    {
        return Ok(tag.to_string());
    }
    let inferred = config.and_then(|c| {
        for phase in ["extraction", "consolidation"] {
            let Some(wrapper) = c
                .get(phase)
                .and_then(Value::as_object)
                .and_then(|m| m.values().find_map(Value::as_object))
            else {
                continue;
            };
            for (override_type, key) in EXTRACTION_OVERRIDE_KEYS
                .iter()
                .chain(CONSOLIDATION_OVERRIDE_KEYS.iter())
            {
                if wrapper.contains_key(*key) {
                    return Some((*override_type).to_string());
                }
            }
        }
        None
    });
    inferred.ok_or_else(|| {
        MemoryError::Validation(format!(
            "cannot determine override type of strategy {}",
            strategy.strategy_id().unwrap_or("<unknown>")
        ))
    })
}
