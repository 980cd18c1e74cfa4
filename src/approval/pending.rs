//! Pending approval queue.
//!
//! The gate enqueues a request here and immediately returns an "awaiting"
//! outcome; resolution arrives later as a separate message. Expiry is
//! wall-clock based and swept explicitly - a pending request never hangs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::request::ApprovalRequest;

#[derive(Debug, Default)]
pub struct PendingApprovals {
    inner: Mutex<HashMap<Uuid, ApprovalRequest>>,
}

impl PendingApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request: ApprovalRequest) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert(request.request_id, request);
        }
    }

    /// Remove and return a request by id. A second take of the same id
    /// returns `None`, which makes duplicate resolutions detectable.
    pub fn take(&self, request_id: Uuid) -> Option<ApprovalRequest> {
        self.inner.lock().ok()?.remove(&request_id)
    }

    /// Remove and return every request expired at `now`.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<ApprovalRequest> {
        let Ok(mut inner) = self.inner.lock() else {
            return Vec::new();
        };
        let expired_ids: Vec<Uuid> = inner
            .values()
            .filter(|r| r.expired_at(now))
            .map(|r| r.request_id)
            .collect();
        expired_ids
            .into_iter()
            .filter_map(|id| inner.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
