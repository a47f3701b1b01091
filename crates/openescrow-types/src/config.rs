//! Configuration types for the OpenEscrow engine.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::{EscrowError, Result};

/// Configuration for a settlement engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum distinct contributors per vault.
    pub max_contributors: usize,
    /// Confidence threshold for the verdict review gate.
    pub review_threshold: u8,
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`EscrowError::Configuration`] for zero capacity or a
    /// threshold above 100.
    pub fn validate(&self) -> Result<()> {
        if self.max_contributors == 0 {
            return Err(EscrowError::Configuration(
                "max_contributors must be at least 1".to_string(),
            ));
        }
        if self.review_threshold > 100 {
            return Err(EscrowError::Configuration(format!(
                "review_threshold {} exceeds 100",
                self.review_threshold
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_contributors: constants::MAX_CONTRIBUTORS,
            review_threshold: constants::CONFIDENCE_REVIEW_THRESHOLD,
        }
    }
}
