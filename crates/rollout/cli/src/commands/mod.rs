//! CLI command implementations

pub mod history;
pub mod monitor;
pub mod operator;
pub mod status;
pub mod transition;
pub mod validate;
