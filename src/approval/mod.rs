//! Approval gate: confidence-routed execution clearance.

mod gate;
mod oracle;
mod pending;
mod request;

pub use gate::{ApprovalGate, LowConfidenceCause, Route};
pub use oracle::{ApprovalDecision, ApprovalOracle, ApproveAll, DenyAll};
pub use pending::PendingApprovals;
pub use request::{derive_risks, ApprovalRequest, ApprovalResponse};
