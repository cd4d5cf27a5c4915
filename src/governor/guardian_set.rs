//! Guardian set and quorum size configuration
//!
//! The guardian set is handed to the aggregator explicitly. Callers refresh
//! it when an on-chain guardian set change is observed and treat it as
//! immutable in between.

use serde::{Deserialize, Serialize};

use super::types::GuardianId;
use crate::error::{Error, Result};

/// Quorum used on mainnet, where the guardian set has 19 members
pub const DEFAULT_MIN_GUARDIANS: usize = 13;

/// A guardian set as published on chain
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSet {
    /// Guardian set index
    #[serde(default)]
    pub index: u32,

    /// Guardian addresses, in guardian-index order
    #[serde(default)]
    pub keys: Vec<GuardianId>,
}

impl GuardianSet {
    pub fn new(index: u32, keys: Vec<GuardianId>) -> Self {
        Self { index, keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Guardians that must agree under this set: `ceil(2N/3)`
    pub fn quorum(&self) -> usize {
        (self.keys.len() * 2).div_ceil(3)
    }

    pub fn contains(&self, guardian: &GuardianId) -> bool {
        self.keys.contains(guardian)
    }

    /// Position of a guardian in the set
    pub fn guardian_index(&self, guardian: &GuardianId) -> Option<usize> {
        self.keys.iter().position(|k| k == guardian)
    }
}

/// How many guardian reports are needed before a value is network-enforced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumConfig {
    /// Externally supplied quorum size
    Fixed { min_guardians: usize },
    /// Quorum derived from the current guardian set
    GuardianSet(GuardianSet),
}

impl Default for QuorumConfig {
    fn default() -> Self {
        QuorumConfig::Fixed {
            min_guardians: DEFAULT_MIN_GUARDIANS,
        }
    }
}

impl QuorumConfig {
    /// Resolved quorum size `k`
    pub fn min_guardians(&self) -> usize {
        match self {
            QuorumConfig::Fixed { min_guardians } => *min_guardians,
            QuorumConfig::GuardianSet(set) => set.quorum(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            QuorumConfig::Fixed { min_guardians: 0 } => Err(Error::ConfigError(
                "min_guardians must be at least 1".to_string(),
            )),
            QuorumConfig::GuardianSet(set) if set.is_empty() => Err(Error::ConfigError(
                "guardian set must contain at least one key".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
