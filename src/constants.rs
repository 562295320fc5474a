//! Shared wire-level literals: status values, strategy type names, the wire
//! keys of the request format, and the override-wrapper key tables used when
//! translating between the request and stored configuration shapes.

use std::time::Duration;

// ─── Resource / strategy status values ──────────────────────────────────────

pub const STATUS_CREATING: &str = "CREATING";
pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_FAILED: &str = "FAILED";
pub const STATUS_UPDATING: &str = "UPDATING";
pub const STATUS_DELETING: &str = "DELETING";

// ─── Strategy types (stored/response format) ────────────────────────────────

pub const TYPE_SEMANTIC: &str = "SEMANTIC";
pub const TYPE_SUMMARIZATION: &str = "SUMMARIZATION";
pub const TYPE_USER_PREFERENCE: &str = "USER_PREFERENCE";
pub const TYPE_CUSTOM: &str = "CUSTOM";

// ─── Override types carried by stored CUSTOM configurations ─────────────────

pub const OVERRIDE_SEMANTIC: &str = "SEMANTIC_OVERRIDE";
pub const OVERRIDE_SUMMARY: &str = "SUMMARY_OVERRIDE";
pub const OVERRIDE_USER_PREFERENCE: &str = "USER_PREFERENCE_OVERRIDE";

// ─── Request-format wire keys ───────────────────────────────────────────────

pub const WIRE_SEMANTIC: &str = "semanticMemoryStrategy";
pub const WIRE_SUMMARY: &str = "summaryMemoryStrategy";
pub const WIRE_USER_PREFERENCE: &str = "userPreferenceMemoryStrategy";
pub const WIRE_CUSTOM: &str = "customMemoryStrategy";

/// Request wire key → stored strategy type, for strategy normalization.
pub const WIRE_KEY_TO_TYPE: [(&str, &str); 4] = [
    (WIRE_SEMANTIC, TYPE_SEMANTIC),
    (WIRE_SUMMARY, TYPE_SUMMARIZATION),
    (WIRE_USER_PREFERENCE, TYPE_USER_PREFERENCE),
    (WIRE_CUSTOM, TYPE_CUSTOM),
];

// ─── Custom configuration nesting ───────────────────────────────────────────

/// Override key inside a requested `customMemoryStrategy.configuration`.
pub const OVERRIDE_KEY_SEMANTIC: &str = "semanticOverride";
pub const OVERRIDE_KEY_SUMMARY: &str = "summaryOverride";
pub const OVERRIDE_KEY_USER_PREFERENCE: &str = "userPreferenceOverride";
pub const SELF_MANAGED_KEY: &str = "selfManagedConfiguration";

/// Wrapper keys the service uses inside stored CUSTOM configurations and in
/// `modifyMemoryStrategies` payloads.
pub const CUSTOM_EXTRACTION_WRAPPER: &str = "customExtractionConfiguration";
pub const CUSTOM_CONSOLIDATION_WRAPPER: &str = "customConsolidationConfiguration";

/// Override type → stored extraction-override key (SUMMARY has none: summary
/// overrides are consolidation-only).
pub const EXTRACTION_OVERRIDE_KEYS: [(&str, &str); 2] = [
    (OVERRIDE_SEMANTIC, "semanticExtractionOverride"),
    (OVERRIDE_USER_PREFERENCE, "userPreferenceExtractionOverride"),
];

/// Override type → stored consolidation-override key.
pub const CONSOLIDATION_OVERRIDE_KEYS: [(&str, &str); 3] = [
    (OVERRIDE_SEMANTIC, "semanticConsolidationOverride"),
    (OVERRIDE_SUMMARY, "summaryConsolidationOverride"),
    (OVERRIDE_USER_PREFERENCE, "userPreferenceConsolidationOverride"),
];

/// Builtin strategy type → wrapper key for a modified extraction block.
pub const BUILTIN_EXTRACTION_WRAPPERS: [(&str, &str); 2] = [
    (TYPE_SEMANTIC, "semanticExtractionConfiguration"),
    (TYPE_USER_PREFERENCE, "userPreferenceExtractionConfiguration"),
];

/// Builtin strategy type → wrapper key for a modified consolidation block.
pub const BUILTIN_CONSOLIDATION_WRAPPERS: [(&str, &str); 3] = [
    (TYPE_SEMANTIC, "semanticConsolidationConfiguration"),
    (TYPE_SUMMARIZATION, "summaryConsolidationConfiguration"),
    (TYPE_USER_PREFERENCE, "userPreferenceConsolidationConfiguration"),
];

// ─── Defaults ───────────────────────────────────────────────────────────────

pub const DEFAULT_EVENT_EXPIRY_DAYS: u32 = 90;
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_HISTORICAL_CONTEXT_WINDOW: u32 = 4;

/// Service-side page cap for the list API.
pub const LIST_PAGE_CAP: u32 = 100;

/// Minimum elapsed time between progress reports during a wait loop.
pub const PROGRESS_CADENCE: Duration = Duration::from_secs(10);

pub fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find_map(|(k, v)| if *k == key { Some(*v) } else { None })
}
