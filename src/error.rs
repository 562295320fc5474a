use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `agentmem`.
///
/// Callers match on these to decide recovery strategy: service errors carry
/// the control plane's own error code untouched (a caller distinguishing
/// "already exists" from "access denied" needs it verbatim), state and
/// timeout errors come from the wait loops, and validation errors are local
/// contract violations that must never be retried.
#[derive(Debug, Error)]
pub enum MemoryError {
    // ── Remote service ──────────────────────────────────────────────────
    #[error(transparent)]
    Service(#[from] ServiceError),

    // ── State (reached a terminal FAILED during a wait) ─────────────────
    #[error("memory {memory_id} reached FAILED state: {reason}")]
    ResourceFailed { memory_id: String, reason: String },

    #[error("memory {memory_id} is ACTIVE but strategies failed: {names:?}")]
    StrategiesFailed {
        memory_id: String,
        names: Vec<String>,
    },

    // ── Wait budget exceeded ────────────────────────────────────────────
    #[error("memory {memory_id} did not stabilize within {max_wait_secs}s")]
    WaitTimeout {
        memory_id: String,
        max_wait_secs: u64,
    },

    // ── Reconciliation refusal ──────────────────────────────────────────
    #[error("existing memory '{memory_name}' does not match requested strategies: {detail}")]
    StrategyMismatch {
        memory_name: String,
        detail: String,
    },

    // ── Caller contract violations ──────────────────────────────────────
    #[error("invalid request: {0}")]
    Validation(String),

    // ── Transport / decoding ────────────────────────────────────────────
    #[error("malformed service payload: {0}")]
    Payload(String),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ─── Service errors ─────────────────────────────────────────────────────────

/// An error reported by the control-plane API itself.
///
/// `code` is the service's error code (`ResourceNotFoundException`,
/// `ConflictException`, …) exactly as received; this crate never remaps it.
#[derive(Debug, Error)]
#[error("service error {code} (http {status}): {message}")]
pub struct ServiceError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl ServiceError {
    /// Whether this error means "the resource does not exist".
    ///
    /// This is the one place an error is reinterpreted as an outcome: the
    /// delete-wait loop treats it as successful deletion.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code == "ResourceNotFoundException"
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MemoryError>;
