#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Events {
    /// Drop `state_updated` payloads whose `seq` is not newer than the last
    /// applied one. Payloads without `seq` are always applied.
    pub drop_stale: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self { drop_stale: true }
    }
}
