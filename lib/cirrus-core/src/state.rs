//! Observed-state snapshot
//!
//! Remote cloud state is treated as an external snapshot: the set of
//! resources realized by previous applies, with their provider-assigned
//! identifiers and the attributes they were created with. The snapshot is
//! fetched (or loaded) at the start of a run, diffed against the desired
//! stack, and replaced wholesale by the applier's result. Nothing mutates
//! it outside that cycle.

use chrono::{DateTime, Utc};
use cirrus_api::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One realized resource
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Declaration identity this record corresponds to
    pub id: ResourceId,

    /// Provider-assigned identifier (e.g. "vpc-0a1b2c…")
    pub resource_id: String,

    /// Canonical serialization of the spec the resource was realized
    /// from; compared against the desired spec to detect drift
    pub attributes: serde_json::Value,
}

/// Snapshot of all realized resources for one stack
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Monotonic counter, incremented per successful apply
    pub serial: u64,

    /// Identity of this state's history; never changes once assigned
    pub lineage: String,

    /// When the snapshot was last written
    pub updated_at: DateTime<Utc>,

    /// Records keyed by `ResourceId::key()`
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
}

impl StateSnapshot {
    /// A fresh snapshot with no realized resources
    pub fn empty() -> Self {
        Self {
            serial: 0,
            lineage: Uuid::new_v4().to_string(),
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResourceRecord> {
        self.resources.get(&id.key())
    }

    /// Provider identifier of a realized resource, if present
    pub fn resolved_id(&self, id: &ResourceId) -> Option<&str> {
        self.get(id).map(|record| record.resource_id.as_str())
    }

    pub fn upsert(&mut self, record: ResourceRecord) {
        self.resources.insert(record.id.key(), record);
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<ResourceRecord> {
        self.resources.remove(&id.key())
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Declaration identities of every record, in key order
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.resources.values().map(|r| r.id.clone()).collect()
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::ResourceKind;

    #[test]
    fn test_upsert_and_lookup() {
        let mut snapshot = StateSnapshot::empty();
        let id = ResourceId::new(ResourceKind::Vpc, "main");
        snapshot.upsert(ResourceRecord {
            id: id.clone(),
            resource_id: "vpc-0123456789abcdef0".to_string(),
            attributes: serde_json::json!({"name": "main"}),
        });

        assert_eq!(snapshot.resource_count(), 1);
        assert_eq!(snapshot.resolved_id(&id), Some("vpc-0123456789abcdef0"));
        assert!(snapshot
            .get(&ResourceId::new(ResourceKind::Subnet, "public"))
            .is_none());
    }

    #[test]
    fn test_empty_snapshots_have_distinct_lineage() {
        assert_ne!(StateSnapshot::empty().lineage, StateSnapshot::empty().lineage);
    }
}
