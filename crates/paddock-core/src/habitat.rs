//! The habitat projection, maintenance records, and derived maintenance
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A habitat is overdue for maintenance once more than this many whole days
/// have passed since the last recorded maintenance.
pub const MAINTENANCE_INTERVAL_DAYS: i64 = 30;

// ─── Habitat ─────────────────────────────────────────────────────────────────

/// One habitat row. `code` is globally unique and immutable once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habitat {
  pub habitat_id:       Uuid,
  pub code:             String,
  pub park_id:          i64,
  pub last_maintenance: Option<DateTime<Utc>>,
}

impl Habitat {
  /// Whole days since the last maintenance; `None` means never maintained.
  pub fn days_since_maintenance(&self, now: DateTime<Utc>) -> Option<i64> {
    self
      .last_maintenance
      .map(|at| now.signed_duration_since(at).num_days())
  }

  /// True once more than [`MAINTENANCE_INTERVAL_DAYS`] whole days have
  /// elapsed. A never-maintained habitat is infinitely overdue and always
  /// requires maintenance.
  pub fn requires_maintenance(&self, now: DateTime<Utc>) -> bool {
    match self.days_since_maintenance(now) {
      Some(days) => days > MAINTENANCE_INTERVAL_DAYS,
      None => true,
    }
  }
}

// ─── Maintenance record ──────────────────────────────────────────────────────

/// One performed-maintenance entry. Append-only; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
  pub maintenance_id: Uuid,
  /// References the habitat by code, not by surrogate key.
  pub location_code:  String,
  pub park_id:        i64,
  pub performed_at:   DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};
  use uuid::Uuid;

  use super::Habitat;

  fn habitat(last_maintenance: Option<chrono::DateTime<Utc>>) -> Habitat {
    Habitat {
      habitat_id: Uuid::new_v4(),
      code: "A1".into(),
      park_id: 1,
      last_maintenance,
    }
  }

  #[test]
  fn thirty_days_exactly_does_not_require_maintenance() {
    let now = Utc::now();
    let h = habitat(Some(now - Duration::days(30)));
    assert_eq!(h.days_since_maintenance(now), Some(30));
    assert!(!h.requires_maintenance(now));
  }

  #[test]
  fn thirty_one_days_requires_maintenance() {
    let now = Utc::now();
    let h = habitat(Some(now - Duration::days(31)));
    assert_eq!(h.days_since_maintenance(now), Some(31));
    assert!(h.requires_maintenance(now));
  }

  #[test]
  fn never_maintained_requires_maintenance() {
    let now = Utc::now();
    let h = habitat(None);
    assert_eq!(h.days_since_maintenance(now), None);
    assert!(h.requires_maintenance(now));
  }

  #[test]
  fn fresh_maintenance_does_not_require() {
    let now = Utc::now();
    let h = habitat(Some(now));
    assert_eq!(h.days_since_maintenance(now), Some(0));
    assert!(!h.requires_maintenance(now));
  }
}
