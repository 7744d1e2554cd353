//! Shared domain value types.
//!
//! These mirror entities owned by the surrounding application (locations,
//! event types, filed event records, directory members). The engine reads
//! them through the collaborator traits in `vigil-rules::stores` and never
//! mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical location (guard book site). Compliance is checked per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

/// A category of filed report (the event type a rule monitors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    pub id: Uuid,
    pub code: String,
    pub description: String,
}

/// One filed report, reduced to what the compliance check needs: its type,
/// where it was filed, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_type_id: Uuid,
    pub location_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An escalation recipient resolved from the group/membership directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    /// Superusers receive escalations for every location.
    pub is_superuser: bool,
    /// Locations this member is assigned to.
    pub location_ids: Vec<Uuid>,
}

impl Recipient {
    /// Whether this member belongs in the audience for `location_id`.
    pub fn covers_location(&self, location_id: Uuid) -> bool {
        self.is_superuser || self.location_ids.contains(&location_id)
    }
}
