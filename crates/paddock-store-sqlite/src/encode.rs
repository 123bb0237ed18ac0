//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans map onto INTEGER columns via
//! rusqlite's native conversion.

use chrono::{DateTime, Utc};
use paddock_core::{
  animal::Animal,
  habitat::{Habitat, MaintenanceRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `habitats` row.
pub struct RawHabitat {
  pub habitat_id:       String,
  pub code:             String,
  pub park_id:          i64,
  pub last_maintenance: Option<String>,
}

impl RawHabitat {
  pub fn into_habitat(self) -> Result<Habitat> {
    Ok(Habitat {
      habitat_id:       decode_uuid(&self.habitat_id)?,
      code:             self.code,
      park_id:          self.park_id,
      last_maintenance: decode_opt_dt(self.last_maintenance.as_deref())?,
    })
  }
}

/// Raw values read directly from an `animals` row.
pub struct RawAnimal {
  pub animal_id:                 String,
  pub subject_id:                i64,
  pub park_id:                   i64,
  pub name:                      String,
  pub species:                   String,
  pub gender:                    Option<String>,
  pub digestion_period_in_hours: Option<i64>,
  pub herbivore:                 Option<bool>,
  pub location_code:             Option<String>,
  pub last_fed:                  Option<String>,
  pub active:                    bool,
  pub created_at:                String,
  pub updated_at:                String,
}

impl RawAnimal {
  pub fn into_animal(self) -> Result<Animal> {
    Ok(Animal {
      animal_id:                 decode_uuid(&self.animal_id)?,
      subject_id:                self.subject_id,
      park_id:                   self.park_id,
      name:                      self.name,
      species:                   self.species,
      gender:                    self.gender,
      digestion_period_in_hours: self.digestion_period_in_hours,
      herbivore:                 self.herbivore,
      location_code:             self.location_code,
      last_fed:                  decode_opt_dt(self.last_fed.as_deref())?,
      active:                    self.active,
      created_at:                decode_dt(&self.created_at)?,
      updated_at:                decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `maintenance` row.
pub struct RawMaintenance {
  pub maintenance_id: String,
  pub location_code:  String,
  pub park_id:        i64,
  pub performed_at:   String,
}

impl RawMaintenance {
  pub fn into_record(self) -> Result<MaintenanceRecord> {
    Ok(MaintenanceRecord {
      maintenance_id: decode_uuid(&self.maintenance_id)?,
      location_code:  self.location_code,
      park_id:        self.park_id,
      performed_at:   decode_dt(&self.performed_at)?,
    })
  }
}
