//! Rollout Store - Persistence for the mode state machine
//!
//! Holds the singleton [`ModeState`](rollout_types::ModeState), the
//! append-only transition audit trail and the persisted quality samples.
//! The controller owns all writes to the state; everyone else reads.
//!
//! Two back-ends are provided:
//!
//! - [`InMemoryModeStore`] for development and tests
//! - [`SqliteModeStore`] backed by `sqlx`

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryModeStore;
pub use sqlite::SqliteModeStore;
pub use traits::{
    sample_retention, ModeStore, RolloutStore, StoreDiagnostics, MODE_STATE_TABLE,
    QUALITY_METRICS_TABLE, SAMPLE_RETENTION_HOURS, TASKS_TABLE, TRANSITIONS_TABLE,
};
