//! Append-only mission store.
//!
//! The store keeps one ordered event list per mission; current state is the
//! fold of that list. Appends validate the transition first, so an invalid
//! history can never be stored. Events are mirrored to the injected
//! persistence sink; a sink failure is logged and queued for reconciliation
//! rather than failing the append.
//!
//! # Concurrency
//! Single-writer-per-mission: an operation that will append claims the
//! mission through `begin_write` first. A second claim while one is
//! outstanding is rejected - first writer wins, nothing is silently
//! overwritten.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use super::event::{self, Applied, MissionEvent};
use super::types::{Mission, MissionId, MissionStatus};
use crate::error::{Error, Result};
use crate::sink::{PersistenceSink, SinkRecord};

/// An event as persisted: mission id, position in that mission's log, event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SequencedEvent {
    pub mission_id: MissionId,
    pub seq: u64,
    pub event: MissionEvent,
}

/// Exclusive write claim on one mission. Released on drop.
pub struct WriterGuard {
    mission_id: MissionId,
    writers: Arc<Mutex<HashSet<MissionId>>>,
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        if let Ok(mut writers) = self.writers.lock() {
            writers.remove(&self.mission_id);
        }
    }
}

pub struct MissionStore {
    events: RwLock<HashMap<MissionId, Vec<MissionEvent>>>,
    writers: Arc<Mutex<HashSet<MissionId>>>,
    sink: Arc<dyn PersistenceSink>,
    /// Events the sink rejected, kept for later reconciliation.
    unsynced: Mutex<Vec<SequencedEvent>>,
}

impl MissionStore {
    pub fn new(sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            writers: Arc::new(Mutex::new(HashSet::new())),
            sink,
            unsynced: Mutex::new(Vec::new()),
        }
    }

    /// Claim exclusive write access to a mission.
    ///
    /// # Errors
    ///
    /// `Error::WriterConflict` if another operation holds the claim.
    pub fn begin_write(&self, mission_id: MissionId) -> Result<WriterGuard> {
        let mut writers = self
            .writers
            .lock()
            .map_err(|_| Error::InvariantViolation("writer set poisoned".to_string()))?;
        if !writers.insert(mission_id) {
            return Err(Error::WriterConflict {
                mission: mission_id,
            });
        }
        Ok(WriterGuard {
            mission_id,
            writers: Arc::clone(&self.writers),
        })
    }

    /// Append one event, returning the mission's new state.
    ///
    /// Idempotent events (re-approval of an approved mission) return the
    /// current state without appending anything.
    pub async fn append(&self, mission_id: MissionId, event: MissionEvent) -> Result<Mission> {
        let mut events = self.events.write().await;
        let current = match events.get(&mission_id) {
            Some(history) if !history.is_empty() => Some(event::fold(mission_id, history)?),
            _ => None,
        };

        let mission = match event::apply(mission_id, current, &event)? {
            Applied::NoOp(mission) => {
                tracing::debug!(
                    mission = %mission_id,
                    event = event.name(),
                    "Idempotent event, nothing appended"
                );
                return Ok(mission);
            }
            Applied::Advanced(mission) => mission,
        };

        let history = events.entry(mission_id).or_default();
        let seq = history.len() as u64;
        history.push(event.clone());
        drop(events);

        tracing::info!(
            mission = %mission_id,
            event = event.name(),
            status = %mission.status,
            "Mission event appended"
        );

        self.mirror(SequencedEvent {
            mission_id,
            seq,
            event,
        })
        .await;

        Ok(mission)
    }

    /// Mirror an event to the persistence sink. Failure is logged and the
    /// event is queued for reconciliation; the append has already succeeded.
    async fn mirror(&self, sequenced: SequencedEvent) {
        let payload = match serde_json::to_value(&sequenced) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize mission event for sink");
                return;
            }
        };
        if let Err(e) = self
            .sink
            .append(&SinkRecord::new("missions", payload))
            .await
        {
            tracing::warn!(
                mission = %sequenced.mission_id,
                error = %e,
                "Persistence sink rejected mission event; queued for reconciliation"
            );
            if let Ok(mut unsynced) = self.unsynced.lock() {
                unsynced.push(sequenced);
            }
        }
    }

    /// Current state of one mission.
    pub async fn get(&self, mission_id: MissionId) -> Result<Mission> {
        let events = self.events.read().await;
        let history = events
            .get(&mission_id)
            .ok_or(Error::MissionNotFound(mission_id))?;
        event::fold(mission_id, history)
    }

    /// Full audit trail of one mission, oldest first.
    pub async fn events(&self, mission_id: MissionId) -> Result<Vec<MissionEvent>> {
        let events = self.events.read().await;
        events
            .get(&mission_id)
            .cloned()
            .ok_or(Error::MissionNotFound(mission_id))
    }

    /// All missions, unordered.
    pub async fn missions(&self) -> Vec<Mission> {
        let events = self.events.read().await;
        events
            .iter()
            .filter_map(|(id, history)| event::fold(*id, history).ok())
            .collect()
    }

    pub async fn missions_by_status(&self, status: MissionStatus) -> Vec<Mission> {
        self.missions()
            .await
            .into_iter()
            .filter(|m| m.status == status)
            .collect()
    }

    /// Total number of missions ever created.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Events still awaiting reconciliation with the sink.
    pub fn unsynced_count(&self) -> usize {
        self.unsynced.lock().map(|u| u.len()).unwrap_or(0)
    }
}
