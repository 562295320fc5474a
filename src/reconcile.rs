//! Structural reconciliation of strategy sets.
//!
//! Decides whether an existing remote memory resource carries the same
//! strategies a caller is requesting, so get-or-create can safely reuse it.
//! The service and callers disagree on naming convention (camelCase wire vs
//! snake_case authors), on how absent optional fields are expressed (omitted
//! vs null vs empty), and on how CUSTOM configurations are nested (request
//! override keys vs stored wrapper keys) — everything is normalized to one
//! canonical shape before a deep comparison. Any mismatch is a hard refusal
//! with a path-annotated diagnostic; this module never mutates anything.

use crate::constants::{
    CONSOLIDATION_OVERRIDE_KEYS, EXTRACTION_OVERRIDE_KEYS, OVERRIDE_KEY_SEMANTIC,
    OVERRIDE_KEY_SUMMARY, OVERRIDE_KEY_USER_PREFERENCE, OVERRIDE_SEMANTIC, OVERRIDE_SUMMARY,
    OVERRIDE_USER_PREFERENCE, TYPE_CUSTOM, WIRE_KEY_TO_TYPE, lookup,
};
use crate::error::{MemoryError, Result};
use serde_json::{Map, Value, json};
use std::collections::{BTreeSet, HashSet};

// ─── Key-case normalization ─────────────────────────────────────────────────

/// camelCase → snake_case, treating an acronym run as a single unit
/// (`topicARN` → `topic_arn`, `ARNValue` → `arn_value`).
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower =
                i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let run_ends = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if after_lower || run_ends {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Recursively rewrite every object key to snake_case. Values are untouched.
pub fn snake_case_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (camel_to_snake(k), snake_case_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(snake_case_keys).collect()),
        other => other.clone(),
    }
}

// ─── Strategy normalization ─────────────────────────────────────────────────

/// Reduce a strategy — request format or stored format — to the canonical
/// `{type, name, description?, namespaces?, configuration?}` shape.
/// Identity and lifecycle fields (strategyId, status, timestamps) are
/// dropped: they are not part of "does this match what I requested".
fn normalize_strategy(strategy: &Value) -> std::result::Result<Value, String> {
    let map = strategy
        .as_object()
        .ok_or_else(|| format!("strategy is not an object: {strategy}"))?;

    // Request format: a single wire key wrapping the body.
    if map.len() == 1 {
        if let Some((wire_key, body)) = map.iter().next() {
            if let Some(strategy_type) = lookup(&WIRE_KEY_TO_TYPE, wire_key) {
                return normalize_request_body(strategy_type, body);
            }
        }
    }

    // Stored format: flat fields from a get/list response.
    let strategy_type = map
        .get("type")
        .or_else(|| map.get("memoryStrategyType"))
        .and_then(Value::as_str)
        .ok_or_else(|| format!("strategy has neither a wire key nor a type field: {strategy}"))?;

    let mut normalized = Map::new();
    normalized.insert("type".into(), json!(strategy_type));
    for field in ["name", "description", "namespaces"] {
        if let Some(v) = map.get(field) {
            normalized.insert(field.into(), v.clone());
        }
    }
    if let Some(config) = map.get("configuration") {
        if let Some(config) = normalize_stored_configuration(strategy_type, config) {
            normalized.insert("configuration".into(), config);
        }
    }
    Ok(snake_case_keys(&Value::Object(normalized)))
}

fn normalize_request_body(
    strategy_type: &str,
    body: &Value,
) -> std::result::Result<Value, String> {
    let body = body
        .as_object()
        .ok_or_else(|| format!("strategy body is not an object: {body}"))?;

    let mut normalized = Map::new();
    normalized.insert("type".into(), json!(strategy_type));
    for field in ["name", "description", "namespaces"] {
        if let Some(v) = body.get(field) {
            normalized.insert(field.into(), v.clone());
        }
    }
    if let Some(config) = body.get("configuration") {
        if let Some(config) = lift_requested_configuration(config) {
            normalized.insert("configuration".into(), config);
        }
    }
    Ok(snake_case_keys(&Value::Object(normalized)))
}

/// Requested custom configuration: `{semanticOverride: {extraction, …}}`
/// becomes `{type: SEMANTIC_OVERRIDE, extraction, …}`.
fn lift_requested_configuration(config: &Value) -> Option<Value> {
    let map = config.as_object()?;
    for (override_key, override_type) in [
        (OVERRIDE_KEY_SEMANTIC, OVERRIDE_SEMANTIC),
        (OVERRIDE_KEY_SUMMARY, OVERRIDE_SUMMARY),
        (OVERRIDE_KEY_USER_PREFERENCE, OVERRIDE_USER_PREFERENCE),
    ] {
        if let Some(inner) = map.get(override_key).and_then(Value::as_object) {
            let mut lifted = Map::new();
            lifted.insert("type".into(), json!(override_type));
            for (k, v) in inner {
                lifted.insert(k.clone(), v.clone());
            }
            return Some(Value::Object(lifted));
        }
    }
    if map.is_empty() {
        return None;
    }
    // Self-managed and anything else: compared structurally as given.
    Some(config.clone())
}

/// Stored custom configuration: the service wraps each phase under
/// `custom*Configuration.<override>…Override`; lift the override value back
/// up so the result matches the requested shape.
fn normalize_stored_configuration(strategy_type: &str, config: &Value) -> Option<Value> {
    let map = config.as_object()?;

    if strategy_type != TYPE_CUSTOM {
        // Builtin strategies may echo their own type back inside the
        // configuration; that restatement is not caller-requested data.
        let kept: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| k.as_str() != "type")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if kept.is_empty() {
            return None;
        }
        return Some(Value::Object(kept));
    }

    let override_type = map
        .get("type")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| infer_override_type(map));

    let mut lifted = Map::new();
    if let Some(override_type) = &override_type {
        lifted.insert("type".into(), json!(override_type));
    }
    for (phase, override_table) in [
        ("extraction", &EXTRACTION_OVERRIDE_KEYS[..]),
        ("consolidation", &CONSOLIDATION_OVERRIDE_KEYS[..]),
    ] {
        if let Some(phase_value) = map.get(phase) {
            lifted.insert(
                phase.into(),
                lift_stored_phase(phase_value, override_type.as_deref(), override_table),
            );
        }
    }
    for (k, v) in map {
        if !matches!(k.as_str(), "type" | "extraction" | "consolidation") {
            lifted.insert(k.clone(), v.clone());
        }
    }
    if lifted.is_empty() {
        return None;
    }
    Some(Value::Object(lifted))
}

/// Descend through a `custom*Configuration` wrapper to the `…Override` value.
fn lift_stored_phase(
    phase_value: &Value,
    override_type: Option<&str>,
    override_table: &[(&'static str, &'static str)],
) -> Value {
    let Some(phase_map) = phase_value.as_object() else {
        return phase_value.clone();
    };
    let wrapper = phase_map.iter().find_map(|(k, v)| {
        (k.starts_with("custom") && k.ends_with("Configuration"))
            .then(|| v.as_object())
            .flatten()
    });
    let Some(wrapper) = wrapper else {
        return phase_value.clone();
    };

    // Prefer the key the override type says should be there; otherwise take
    // any override-suffixed key.
    if let Some(expected) = override_type.and_then(|t| lookup(override_table, t)) {
        if let Some(inner) = wrapper.get(expected) {
            return inner.clone();
        }
    }
    wrapper
        .iter()
        .find_map(|(k, v)| k.ends_with("Override").then(|| v.clone()))
        .unwrap_or_else(|| phase_value.clone())
}

fn infer_override_type(config: &Map<String, Value>) -> Option<String> {
    for phase in ["extraction", "consolidation"] {
        let Some(wrapper) = config
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
}

// ─── Deep structural comparison ─────────────────────────────────────────────

fn is_noneish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// "None is equivalent to empty": the service sometimes omits, sometimes
/// nulls, sometimes empty-strings an optional field. Deliberately scoped to
/// this reconciliation — do not generalize.
fn is_emptyish(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn namespace_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map_or_else(|| v.to_string(), ToString::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Namespaces compare as sets; either side absent or empty is vacuously
/// equal (the service may assign namespaces server-side).
fn compare_namespaces(
    path: &str,
    existing: Option<&Value>,
    requested: Option<&Value>,
) -> std::result::Result<(), String> {
    let existing_set = namespace_set(existing);
    let requested_set = namespace_set(requested);
    if existing_set.is_empty() || requested_set.is_empty() {
        return Ok(());
    }
    if existing_set == requested_set {
        return Ok(());
    }
    let only_existing: Vec<&String> = existing_set.difference(&requested_set).collect();
    let only_requested: Vec<&String> = requested_set.difference(&existing_set).collect();
    Err(format!(
        "{path}: namespace sets differ (only existing: {only_existing:?}, only requested: {only_requested:?})"
    ))
}

fn compare_values(
    path: &str,
    existing: Option<&Value>,
    requested: Option<&Value>,
) -> std::result::Result<(), String> {
    // Absent/null on one side tolerates empty on the other.
    if is_noneish(existing) || is_noneish(requested) {
        if is_emptyish(existing) && is_emptyish(requested) {
            return Ok(());
        }
        let existing = existing.unwrap_or(&Value::Null);
        let requested = requested.unwrap_or(&Value::Null);
        return Err(format!(
            "{path}: existing {existing} != requested {requested}"
        ));
    }

    let (Some(existing), Some(requested)) = (existing, requested) else {
        unreachable!("noneish handled above");
    };

    match (existing, requested) {
        (Value::Object(e), Value::Object(r)) => {
            let keys: HashSet<&String> = e.keys().chain(r.keys()).collect();
            let mut keys: Vec<&String> = keys.into_iter().collect();
            keys.sort();
            for key in keys {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                if key == "namespaces" {
                    compare_namespaces(&child_path, e.get(key), r.get(key))?;
                } else {
                    compare_values(&child_path, e.get(key), r.get(key))?;
                }
            }
            Ok(())
        }
        (Value::Array(e), Value::Array(r)) => {
            if e.len() != r.len() {
                return Err(format!(
                    "{path}: list lengths differ (existing {}, requested {})",
                    e.len(),
                    r.len()
                ));
            }
            for (i, (ev, rv)) in e.iter().zip(r.iter()).enumerate() {
                compare_values(&format!("{path}[{i}]"), Some(ev), Some(rv))?;
            }
            Ok(())
        }
        (e, r) if type_name(e) != type_name(r) => Err(format!(
            "{path}: type mismatch (existing {} {e}, requested {} {r})",
            type_name(e),
            type_name(r)
        )),
        (e, r) if e == r => Ok(()),
        (e, r) => Err(format!("{path}: existing {e} != requested {r}")),
    }
}

// ─── Set-level comparison ───────────────────────────────────────────────────

fn sort_key(strategy: &Value) -> (String, String) {
    let field = |key: &str| {
        strategy
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (field("type"), field("name"))
}

fn type_list(strategies: &[Value]) -> Vec<String> {
    strategies
        .iter()
        .map(|s| {
            s.get("type")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string()
        })
        .collect()
}

/// Compare an existing resource's strategies against a requested set.
/// Both sides are normalized, sorted by `(type, name)` for stable pairing,
/// and deep-compared pairwise; the first mismatch is reported with the
/// failing strategy's position and a path-annotated diagnostic.
pub fn compare_strategy_sets(
    existing: &[Value],
    requested: &[Value],
) -> std::result::Result<(), String> {
    let mut existing: Vec<Value> = existing
        .iter()
        .map(normalize_strategy)
        .collect::<std::result::Result<_, _>>()?;
    let mut requested: Vec<Value> = requested
        .iter()
        .map(normalize_strategy)
        .collect::<std::result::Result<_, _>>()?;

    if existing.len() != requested.len() {
        return Err(format!(
            "strategy count mismatch: existing has {} {:?}, requested has {} {:?}",
            existing.len(),
            type_list(&existing),
            requested.len(),
            type_list(&requested)
        ));
    }

    existing.sort_by_key(sort_key);
    requested.sort_by_key(sort_key);

    for (i, (e, r)) in existing.iter().zip(requested.iter()).enumerate() {
        let label = r
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        compare_values("", Some(e), Some(r))
            .map_err(|diag| format!("strategy {i} ('{label}'): {diag}"))?;
    }
    Ok(())
}

/// Refuse to reuse `memory_name` unless its strategies match the requested
/// set; success is logged, mismatch is a hard [`MemoryError::StrategyMismatch`].
pub fn validate_existing_memory_strategies(
    existing: &[Value],
    requested: &[Value],
    memory_name: &str,
) -> Result<()> {
    match compare_strategy_sets(existing, requested) {
        Ok(()) => {
            tracing::debug!(
                memory_name,
                strategies = existing.len(),
                "Existing strategies match requested strategies"
            );
            Ok(())
        }
        Err(detail) => Err(MemoryError::StrategyMismatch {
            memory_name: memory_name.to_string(),
            detail,
        }),
    }
}
