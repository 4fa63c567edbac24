//! Rollout Metrics - Clients for the controller's external collaborators
//!
//! The controller consumes three things from the outside world:
//!
//! - **Telemetry** via [`MetricsSource`]: quality scores of the governed
//!   component and task statistics of the dependent orchestrator
//! - **Health** via [`HealthChecker`]: 2xx probes against dependent services
//! - **Authority** via [`AuthoritySwitch`]: the governed component's level switch
//!
//! HTTP implementations retry transient failures with bounded exponential
//! backoff ([`RetryPolicy`]). The [`mock`] module provides in-process
//! collaborators for tests.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod config;
mod error;
mod health;
pub mod mock;
mod retry;
mod source;
mod switch;

pub use config::{MetricsConfig, ServiceEndpoint};
pub use error::{MetricsError, MetricsResult};
pub use health::{HealthChecker, HttpHealthChecker};
pub use mock::{RecordingSwitch, StaticHealthChecker, StaticMetricsSource};
pub use retry::RetryPolicy;
pub use source::{HttpMetricsClient, MetricsSource};
pub use switch::{AuthoritySwitch, HttpAuthoritySwitch};
