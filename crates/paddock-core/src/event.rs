//! Feed event types — the raw input to the reconciliation pipeline.
//!
//! The feed delivers a snapshot of recent park activity as a JSON array of
//! `kind`-tagged objects. Delivery is unreliable: events arrive out of order,
//! duplicated across polling cycles, and sometimes before the `dino_added`
//! event they causally depend on. Nothing here is trusted until it has been
//! logged (deduplicated) and applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── EventKind ───────────────────────────────────────────────────────────────

/// The closed set of feed event kinds. Serialised names match the wire
/// format (`dino_added`, `dino_fed`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  DinoAdded,
  DinoFed,
  DinoLocationUpdated,
  DinoRemoved,
  MaintenancePerformed,
}

impl EventKind {
  /// The discriminant string stored in the `kind` column of the event log.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::DinoAdded => "dino_added",
      Self::DinoFed => "dino_fed",
      Self::DinoLocationUpdated => "dino_location_updated",
      Self::DinoRemoved => "dino_removed",
      Self::MaintenancePerformed => "maintenance_performed",
    }
  }
}

impl std::fmt::Display for EventKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── FeedEvent ───────────────────────────────────────────────────────────────

/// One raw event as delivered by the feed.
///
/// `time` is the event's declared timestamp, not its arrival time; all
/// conflict resolution compares declared timestamps (last-write-wins by
/// event time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
  DinoAdded {
    /// The feed's stable identifier for the animal (subject id), distinct
    /// from any storage-internal key.
    id:                        i64,
    park_id:                   i64,
    time:                      DateTime<Utc>,
    name:                      String,
    species:                   String,
    gender:                    Option<String>,
    digestion_period_in_hours: Option<i64>,
    herbivore:                 Option<bool>,
  },
  DinoFed {
    dinosaur_id: i64,
    park_id:     i64,
    time:        DateTime<Utc>,
  },
  DinoLocationUpdated {
    dinosaur_id: i64,
    park_id:     i64,
    time:        DateTime<Utc>,
    /// Target habitat code.
    location:    String,
  },
  DinoRemoved {
    dinosaur_id: i64,
    park_id:     i64,
    time:        DateTime<Utc>,
  },
  MaintenancePerformed {
    location: String,
    park_id:  i64,
    time:     DateTime<Utc>,
  },
}

impl FeedEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      Self::DinoAdded { .. } => EventKind::DinoAdded,
      Self::DinoFed { .. } => EventKind::DinoFed,
      Self::DinoLocationUpdated { .. } => EventKind::DinoLocationUpdated,
      Self::DinoRemoved { .. } => EventKind::DinoRemoved,
      Self::MaintenancePerformed { .. } => EventKind::MaintenancePerformed,
    }
  }

  /// The subject id this event refers to, if any. Maintenance events target
  /// a habitat, not an animal.
  pub fn subject_id(&self) -> Option<i64> {
    match self {
      Self::DinoAdded { id, .. } => Some(*id),
      Self::DinoFed { dinosaur_id, .. }
      | Self::DinoLocationUpdated { dinosaur_id, .. }
      | Self::DinoRemoved { dinosaur_id, .. } => Some(*dinosaur_id),
      Self::MaintenancePerformed { .. } => None,
    }
  }

  pub fn park_id(&self) -> i64 {
    match self {
      Self::DinoAdded { park_id, .. }
      | Self::DinoFed { park_id, .. }
      | Self::DinoLocationUpdated { park_id, .. }
      | Self::DinoRemoved { park_id, .. }
      | Self::MaintenancePerformed { park_id, .. } => *park_id,
    }
  }

  pub fn time(&self) -> DateTime<Utc> {
    match self {
      Self::DinoAdded { time, .. }
      | Self::DinoFed { time, .. }
      | Self::DinoLocationUpdated { time, .. }
      | Self::DinoRemoved { time, .. }
      | Self::MaintenancePerformed { time, .. } => *time,
    }
  }

  /// The habitat code this event names, if any.
  pub fn location(&self) -> Option<&str> {
    match self {
      Self::DinoLocationUpdated { location, .. }
      | Self::MaintenancePerformed { location, .. } => Some(location),
      _ => None,
    }
  }

  /// True for `dino_added` — the only event with no prerequisite of its own.
  pub fn is_creation(&self) -> bool {
    matches!(self, Self::DinoAdded { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_format_roundtrip() {
    let json = r#"{
      "kind": "dino_added",
      "id": 1,
      "park_id": 1,
      "time": "2024-01-10T12:00:00Z",
      "name": "Rex",
      "species": "T-Rex",
      "gender": "male",
      "digestion_period_in_hours": 48,
      "herbivore": false
    }"#;

    let event: FeedEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.kind(), EventKind::DinoAdded);
    assert_eq!(event.subject_id(), Some(1));
    assert!(event.is_creation());

    let back = serde_json::to_value(&event).unwrap();
    assert_eq!(back["kind"], "dino_added");
    assert_eq!(back["id"], 1);
  }

  #[test]
  fn maintenance_has_no_subject() {
    let json = r#"{
      "kind": "maintenance_performed",
      "location": "A1",
      "park_id": 1,
      "time": "2024-01-10T12:00:00Z"
    }"#;

    let event: FeedEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.subject_id(), None);
    assert_eq!(event.location(), Some("A1"));
    assert!(!event.is_creation());
  }
}
