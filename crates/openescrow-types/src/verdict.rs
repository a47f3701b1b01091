//! Judgment oracle verdict types.
//!
//! The engine never computes a verdict and never calls the judgment oracle.
//! These types model the out-of-band decision the oracle authority reads
//! before choosing to call `release` or `refund`.

use serde::{Deserialize, Serialize};

use crate::constants::CONFIDENCE_REVIEW_THRESHOLD;

/// The judgment oracle's decision about a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictOutcome {
    /// Delivery satisfies the declared requirements.
    Pass,
    /// Delivery does not satisfy the declared requirements.
    Fail,
    /// Confidence too low for an automatic decision; a human reviews.
    PendingReview,
}

impl std::fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::PendingReview => write!(f, "PENDING_REVIEW"),
        }
    }
}

/// A complete verdict as produced by the external judgment oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// PASS / FAIL / PENDING_REVIEW.
    pub outcome: VerdictOutcome,
    /// Confidence in the outcome, 0–100.
    pub confidence_score: u8,
    /// Free-form reasoning from the oracle.
    pub reasoning: String,
    /// Flags raised during verification (e.g. "RUNTIME_ERROR").
    pub risk_flags: Vec<String>,
}

impl Verdict {
    /// Apply the borderline-confidence gate: a PASS below `threshold`
    /// is demoted to PENDING_REVIEW so a human can look at it first.
    #[must_use]
    pub fn normalized(mut self, threshold: u8) -> Self {
        if self.outcome == VerdictOutcome::Pass && self.confidence_score < threshold {
            self.outcome = VerdictOutcome::PendingReview;
        }
        self
    }

    /// Same as [`Self::normalized`] with the default threshold.
    #[must_use]
    pub fn normalized_default(self) -> Self {
        self.normalized(CONFIDENCE_REVIEW_THRESHOLD)
    }

    /// Whether this verdict recommends releasing the escrowed funds.
    /// Only a confident PASS does; PENDING_REVIEW never releases.
    #[must_use]
    pub fn release_funds(&self) -> bool {
        self.outcome == VerdictOutcome::Pass
            && self.confidence_score >= CONFIDENCE_REVIEW_THRESHOLD
    }
}
