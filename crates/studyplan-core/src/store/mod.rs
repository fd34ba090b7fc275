//! In-memory plan store.
//!
//! Plans live for the lifetime of the process: there is no eviction, no
//! persistence and no delete. Records are inserted once, fully built, under
//! a freshly generated key and are only read afterwards.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::plan::PlanRecord;

/// Identifier of a stored plan: `plan_<unix seconds>_<8 hex chars>`.
///
/// The timestamp keeps ids readable and roughly ordered; the random suffix
/// keeps plans created in the same second apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    /// Generate a new id for a plan created at `created_at`.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        let mut suffix = [0u8; 4];
        rand::rng().fill(&mut suffix);
        Self(format!(
            "plan_{}_{}",
            created_at.timestamp(),
            hex::encode(suffix)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PlanId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlanId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Process-lifetime map from [`PlanId`] to [`PlanRecord`].
///
/// Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct PlanStore {
    plans: Arc<RwLock<HashMap<PlanId, Arc<PlanRecord>>>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finished record under a new id and return the id.
    ///
    /// An existing entry is never overwritten: if a generated id is already
    /// taken, another is drawn.
    pub async fn insert(&self, record: PlanRecord) -> PlanId {
        let record = Arc::new(record);
        let mut plans = self.plans.write().await;
        loop {
            let id = PlanId::generate(record.created_at);
            match plans.entry(id) {
                Entry::Vacant(slot) => {
                    let id = slot.key().clone();
                    slot.insert(Arc::clone(&record));
                    debug!(plan_id = %id, total = plans.len(), "stored plan");
                    return id;
                }
                Entry::Occupied(slot) => {
                    warn!(plan_id = %slot.key(), "plan id collision, drawing a new id");
                }
            }
        }
    }

    /// Look up a plan by id.
    pub async fn get(&self, id: &str) -> Option<Arc<PlanRecord>> {
        self.plans.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.plans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plans.read().await.is_empty()
    }
}
