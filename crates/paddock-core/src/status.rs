//! The aggregated park-status view — a pure join of habitats and their
//! occupants.
//!
//! This view has no independent existence: it is recomputed on demand from
//! the habitat and animal projections and only ever lives in the TTL cache.
//! It must never be treated as authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{animal::Animal, habitat::Habitat};

// ─── Per-habitat status ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
  pub required: bool,
  /// Whole days since last maintenance; `null` means never maintained.
  pub days_since_last_maintenance: Option<i64>,
  /// True when the habitat is empty or its occupant is currently safe to be
  /// around.
  pub safe_for_maintenance: bool,
}

/// Snapshot of the occupant embedded in the status view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantDetails {
  pub name:                      String,
  pub species:                   String,
  pub herbivore:                 Option<bool>,
  pub is_digesting:              bool,
  pub digestion_period_in_hours: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyStatus {
  pub has_occupant: bool,
  /// Vacuously true for an empty habitat.
  pub is_safe:      bool,
  pub details:      Option<OccupantDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitatStatus {
  pub code:        String,
  pub maintenance: MaintenanceStatus,
  pub occupancy:   OccupancyStatus,
}

// ─── Park-wide view ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkStats {
  pub total_habitats:               usize,
  pub occupied_habitats:            usize,
  pub habitats_needing_maintenance: usize,
  pub safe_habitats:                usize,
}

/// Flat per-animal summary included alongside the habitat join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalSummary {
  pub id:       i64,
  pub name:     String,
  pub species:  String,
  pub location: Option<String>,
}

/// The full aggregate view served by `GET /park/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkStatus {
  pub habitats: Vec<HabitatStatus>,
  pub stats:    ParkStats,
  pub animals:  Vec<AnimalSummary>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Join habitats with their (at most one) active occupant and compute the
/// park-wide aggregate view.
///
/// `animals` must already be filtered to active rows; inactive animals are
/// excluded from all status views. Pure — the only side effect is the
/// caller's decision to cache the result.
pub fn compute_park_status(
  habitats: &[Habitat],
  animals: &[Animal],
  now: DateTime<Utc>,
) -> ParkStatus {
  let statuses: Vec<HabitatStatus> = habitats
    .iter()
    .map(|habitat| {
      let occupant = animals
        .iter()
        .find(|a| a.location_code.as_deref() == Some(habitat.code.as_str()));

      let occupant_safe = occupant.map(|a| a.is_safe(now));

      HabitatStatus {
        code:        habitat.code.clone(),
        maintenance: MaintenanceStatus {
          required: habitat.requires_maintenance(now),
          days_since_last_maintenance: habitat.days_since_maintenance(now),
          safe_for_maintenance: occupant_safe.unwrap_or(true),
        },
        occupancy:   OccupancyStatus {
          has_occupant: occupant.is_some(),
          is_safe:      occupant_safe.unwrap_or(true),
          details:      occupant.map(|a| OccupantDetails {
            name:                      a.name.clone(),
            species:                   a.species.clone(),
            herbivore:                 a.herbivore,
            is_digesting:              a.is_digesting(now),
            digestion_period_in_hours: a.digestion_period_in_hours,
          }),
        },
      }
    })
    .collect();

  let stats = ParkStats {
    total_habitats:               statuses.len(),
    occupied_habitats:            statuses.iter().filter(|s| s.occupancy.has_occupant).count(),
    habitats_needing_maintenance: statuses.iter().filter(|s| s.maintenance.required).count(),
    safe_habitats:                statuses.iter().filter(|s| s.occupancy.is_safe).count(),
  };

  let animal_summaries = animals
    .iter()
    .map(|a| AnimalSummary {
      id:       a.subject_id,
      name:     a.name.clone(),
      species:  a.species.clone(),
      location: a.location_code.clone(),
    })
    .collect();

  ParkStatus {
    habitats: statuses,
    stats,
    animals: animal_summaries,
  }
}
