//! Deployment environments for the rollout controller
//!
//! The environment decides how much ceremony the command surface applies
//! before an operator-initiated transition:
//! - Development: no confirmation, relaxed defaults
//! - Staging: no confirmation
//! - Production: interactive confirmation before changing authority

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment the controller is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development and testing
    #[default]
    Development,

    /// Pre-production environment
    Staging,

    /// Production pipeline; authority changes require confirmation
    Production,
}

impl Environment {
    /// Does an operator-initiated transition need interactive confirmation?
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_production_confirms() {
        assert!(!Environment::Development.requires_confirmation());
        assert!(!Environment::Staging.requires_confirmation());
        assert!(Environment::Production.requires_confirmation());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("qa".parse::<Environment>().is_err());
    }
}
