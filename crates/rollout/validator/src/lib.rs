//! Rollout Validator - Readiness validation for authority transitions
//!
//! Two complementary checks:
//!
//! - [`ReadinessValidator::validate`] runs six concurrent, isolated stages
//!   (quality, performance, data integrity, service health, task processing,
//!   security) and produces a weighted [`ReadinessReport`](rollout_types::ReadinessReport)
//!   for operators.
//! - [`evaluate_transition_readiness`] is the narrow per-level gate the
//!   controller and trend monitor consult before a promotion.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod config;
mod error;
mod gate;
pub mod stages;
mod validator;

pub use config::ValidatorConfig;
pub use error::{ValidationError, ValidationResult};
pub use gate::{evaluate_transition_readiness, GateContext, LevelRequirements};
pub use validator::{aggregate, ReadinessValidator, IMPROVEMENT_SCORE, READY_SCORE};
