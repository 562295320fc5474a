#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

//! `agentmem` — memory-resource lifecycle core for managed agent deployments.
//!
//! The crate owns three things:
//! - a typed model of memory *strategies* (extraction/consolidation policies)
//!   and their wire representation ([`strategies`]),
//! - a structural comparator that decides whether an existing remote memory
//!   resource matches what a caller requested ([`reconcile`]),
//! - the [`manager::MemoryManager`], which drives create / mutate / delete
//!   round-trips against the control plane and bridges its asynchronous
//!   provisioning model to callers via explicit poll-and-wait loops.
//!
//! Everything else — CLI prompts, container builds, IAM plumbing, the local
//! project-config file — lives in the surrounding toolkit and talks to this
//! crate through [`manager::MemoryManager`] and the [`client::ControlPlane`]
//! seam.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod manager;
pub mod reconcile;
pub mod strategies;
pub mod views;

pub use client::{ControlPlane, HttpControlPlane};
pub use config::{MemoryConfig, MemoryMode};
pub use error::{MemoryError, Result, ServiceError};
pub use manager::{
    CreateMemoryParams, MemoryManager, ProgressReporter, StrategyUpdates, WaitEvent, WaitOptions,
};
pub use strategies::{
    ConsolidationConfig, CustomSemanticStrategy, CustomSummaryStrategy,
    CustomUserPreferenceStrategy, ExtractionConfig, InvocationConfig, SelfManagedStrategy,
    SemanticStrategy, StrategyInput, StrategySpec, SummaryStrategy, TriggerCondition,
    UserPreferenceStrategy,
};
pub use views::{MemoryStatus, MemorySummary, MemoryView, StrategyStatus, StrategyView};
