//! Rollout Types - Core types for progressive authority rollout
//!
//! The rollout layer governs how much operational authority the governed
//! component holds over the orchestration pipeline. Authority moves through
//! three ordered levels, one step at a time, gated on live quality telemetry.
//!
//! ## Key Concepts
//!
//! - **AuthorityLevel**: Observing, Partial, Full
//! - **ModeState**: The singleton record of the current level and phase
//! - **TransitionRecord**: Append-only audit trail of level changes
//! - **QualitySample / MetricsSnapshot**: Telemetry consumed by the gates
//! - **ReadinessReport**: Six-stage diagnostic validation result
//! - **Events**: Observer notifications for transitions and automation

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod environment;
pub mod events;
pub mod health;
pub mod level;
pub mod metrics;
pub mod state;
pub mod transition;
pub mod validation;

// Re-export main types
pub use environment::Environment;
pub use events::{EventSeverity, EventSource, RolloutEvent, RolloutEventEnvelope};
pub use health::ServiceHealth;
pub use level::{AuthorityLevel, ParseLevelError, TransitionPhase};
pub use metrics::{MetricsSnapshot, QualitySample};
pub use state::ModeState;
pub use transition::{TransitionKind, TransitionRecord, TransitionStatus};
pub use validation::{
    Issue, IssueSeverity, OverallStatus, ReadinessGate, ReadinessReport, StageStatus,
    ValidationStageResult,
};
