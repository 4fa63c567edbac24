//! Rollout Controller - Quality-gated authority transitions
//!
//! The [`TransitionController`] is the only component allowed to change the
//! governed component's authority level. A transition:
//!
//! 1. Checks preconditions (stable phase, adjacent target, attempt cap)
//! 2. Persists the attempt and opens an audit record
//! 3. Evaluates the readiness gate (promotions only)
//! 4. Runs pre-transition health checks
//! 5. Applies the level through the authority switch
//! 6. Waits for the settle period and checks for quality regression
//!
//! Any failure after step 2 rolls the level back and seals the record.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod config;
mod controller;
mod error;
mod events;

pub use config::ControllerConfig;
pub use controller::{TransitionController, TransitionReport};
pub use error::{Result, TransitionError};
pub use events::EventBus;
