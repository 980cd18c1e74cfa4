//! The approval oracle capability.
//!
//! Whoever answers approval requests - a human behind a UI, a policy
//! engine - sits behind this trait, so a stub and a real implementation are
//! interchangeable without touching gating logic.

use async_trait::async_trait;

use super::request::ApprovalRequest;

/// An external decision on one request.
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub feedback: Option<String>,
}

#[async_trait]
pub trait ApprovalOracle: Send + Sync {
    /// Judge an approval request.
    async fn validate(&self, request: &ApprovalRequest) -> anyhow::Result<ApprovalDecision>;
}

/// Approves everything. Test stub.
#[derive(Debug, Default)]
pub struct ApproveAll;

#[async_trait]
impl ApprovalOracle for ApproveAll {
    async fn validate(&self, _request: &ApprovalRequest) -> anyhow::Result<ApprovalDecision> {
        Ok(ApprovalDecision {
            approved: true,
            feedback: None,
        })
    }
}

/// Denies everything, with an optional reason. Test stub.
#[derive(Debug, Default)]
pub struct DenyAll {
    pub feedback: Option<String>,
}

#[async_trait]
impl ApprovalOracle for DenyAll {
    async fn validate(&self, _request: &ApprovalRequest) -> anyhow::Result<ApprovalDecision> {
        Ok(ApprovalDecision {
            approved: false,
            feedback: self.feedback.clone(),
        })
    }
}
