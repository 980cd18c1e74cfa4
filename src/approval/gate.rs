//! Confidence-threshold approval routing.
//!
//! The routing is monotonic by construction: raising confidence can only
//! move a goal toward a more permissive path, never a stricter one.

use crate::config::Thresholds;

/// Where a READY goal goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Confidence cleared the high threshold; execute without asking.
    AutoExecute,
    /// Mid confidence: suspend and ask the approval oracle.
    RequestApproval,
    /// Low confidence caused by infeasibility: reject outright.
    Reject,
    /// Low confidence caused by ambiguity: ask a clarifying question instead.
    Clarify,
}

/// Why a low-confidence goal scored low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowConfidenceCause {
    Ambiguity,
    Infeasibility,
}

#[derive(Debug, Clone)]
pub struct ApprovalGate {
    thresholds: Thresholds,
}

impl ApprovalGate {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Route a confidence score.
    pub fn route(&self, confidence: f64, cause: LowConfidenceCause) -> Route {
        if confidence >= self.thresholds.high {
            Route::AutoExecute
        } else if confidence >= self.thresholds.medium {
            Route::RequestApproval
        } else {
            match cause {
                LowConfidenceCause::Ambiguity => Route::Clarify,
                LowConfidenceCause::Infeasibility => Route::Reject,
            }
        }
    }
}
