//! The animal projection and its derived safety state.
//!
//! Derived fields (`is_digesting`, `is_safe`) are never persisted; they are
//! pure functions of the stored row and a caller-supplied `now`, invoked
//! wherever the entity is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One animal projection row, materialised from the event log by the applier.
///
/// The feed identity is `(subject_id, park_id)`; `animal_id` is a
/// storage-internal surrogate. At most one row exists per feed identity.
/// Removal is logical: `active` flips to `false` and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
  pub animal_id:                 Uuid,
  pub subject_id:                i64,
  pub park_id:                   i64,
  pub name:                      String,
  pub species:                   String,
  pub gender:                    Option<String>,
  pub digestion_period_in_hours: Option<i64>,
  /// Absence is treated as "not herbivorous" for safety purposes.
  pub herbivore:                 Option<bool>,
  /// Current habitat code; `None` when unassigned.
  pub location_code:             Option<String>,
  pub last_fed:                  Option<DateTime<Utc>>,
  pub active:                    bool,
  /// Set from the creating event's declared time, not wall clock, so replay
  /// is deterministic.
  pub created_at:                DateTime<Utc>,
  /// Advanced only by events with a strictly newer declared time.
  pub updated_at:                DateTime<Utc>,
}

impl Animal {
  /// True iff the animal was fed, has a known digestion period, and fewer
  /// whole hours than that period have elapsed since feeding.
  pub fn is_digesting(&self, now: DateTime<Utc>) -> bool {
    match (self.last_fed, self.digestion_period_in_hours) {
      (Some(fed), Some(period)) => now.signed_duration_since(fed).num_hours() < period,
      _ => false,
    }
  }

  /// Herbivores are always safe; everything else is safe only while
  /// digesting. An animal with unknown herbivore status counts as a
  /// carnivore.
  pub fn is_safe(&self, now: DateTime<Utc>) -> bool {
    self.herbivore.unwrap_or(false) || self.is_digesting(now)
  }
}
