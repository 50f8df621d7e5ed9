#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One extracted code, as reported by the log backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    code: String,
    timestamp: String,
    #[serde(default)]
    round_type: Option<String>,
}

impl CodeEntry {
    pub fn new(
        code: impl Into<String>,
        timestamp: impl Into<String>,
        round_type: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            timestamp: timestamp.into(),
            round_type,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn round_type(&self) -> Option<&str> {
        self.round_type.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTypeStats {
    pub survivals: u64,
    pub deaths: u64,
}

/// Aggregates owned by the backend. Stored and forwarded as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub total_rounds: u64,
    pub deaths: u64,
    pub round_types: BTreeMap<String, RoundTypeStats>,
}

impl RoundStats {
    pub fn round_type(&self, name: &str) -> Option<&RoundTypeStats> {
        self.round_types.get(name)
    }
}
