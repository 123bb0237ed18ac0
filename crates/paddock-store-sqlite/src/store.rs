//! [`SqliteStore`] — the SQLite implementation of [`ParkStore`], including
//! the transactional event applier.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use paddock_core::{
  animal::Animal,
  event::FeedEvent,
  habitat::{Habitat, MaintenanceRecord},
  store::{ParkStore, RecordOutcome},
};

use crate::{
  Error, Result,
  encode::{RawAnimal, RawHabitat, RawMaintenance, decode_dt, decode_opt_dt, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A paddock store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Applier internals ───────────────────────────────────────────────────────

/// Failure inside an application transaction. `Fail` rolls the transaction
/// back and surfaces as a per-event error; `Db` is a backend failure.
enum ApplyError {
  Fail(Error),
  Db(rusqlite::Error),
}

impl From<rusqlite::Error> for ApplyError {
  fn from(e: rusqlite::Error) -> Self { Self::Db(e) }
}

impl From<Error> for ApplyError {
  fn from(e: Error) -> Self { Self::Fail(e) }
}

impl From<paddock_core::Error> for ApplyError {
  fn from(e: paddock_core::Error) -> Self { Self::Fail(Error::Core(e)) }
}

type ApplyResult<T = ()> = std::result::Result<T, ApplyError>;

/// Dispatch one event inside an open transaction.
fn apply_in_tx(tx: &rusqlite::Transaction<'_>, event: &FeedEvent) -> ApplyResult {
  match event {
    FeedEvent::DinoAdded {
      id,
      park_id,
      time,
      name,
      species,
      gender,
      digestion_period_in_hours,
      herbivore,
    } => apply_added(tx, AddedFields {
      subject_id: *id,
      park_id: *park_id,
      time: *time,
      name,
      species,
      gender: gender.as_deref(),
      digestion_period_in_hours: *digestion_period_in_hours,
      herbivore: *herbivore,
    }),
    FeedEvent::DinoFed { dinosaur_id, park_id, time } => {
      apply_fed(tx, *dinosaur_id, *park_id, *time)
    }
    FeedEvent::DinoLocationUpdated { dinosaur_id, park_id, time, location } => {
      apply_moved(tx, *dinosaur_id, *park_id, *time, location)
    }
    FeedEvent::DinoRemoved { dinosaur_id, park_id, time } => {
      apply_removed(tx, *dinosaur_id, *park_id, *time)
    }
    FeedEvent::MaintenancePerformed { location, park_id, time } => {
      apply_maintenance(tx, location, *park_id, *time)
    }
  }
}

/// Borrowed view of a `dino_added` event's attributes.
struct AddedFields<'a> {
  subject_id:                i64,
  park_id:                   i64,
  time:                      DateTime<Utc>,
  name:                      &'a str,
  species:                   &'a str,
  gender:                    Option<&'a str>,
  digestion_period_in_hours: Option<i64>,
  herbivore:                 Option<bool>,
}

/// `dino_added`: idempotent insert. A projection already present for the
/// feed identity (active or not) makes this a no-op, which is what lets the
/// causal resolver re-apply creation events safely.
fn apply_added(tx: &rusqlite::Transaction<'_>, fields: AddedFields<'_>) -> ApplyResult {
  let exists: bool = tx
    .query_row(
      "SELECT 1 FROM animals WHERE subject_id = ?1 AND park_id = ?2",
      rusqlite::params![fields.subject_id, fields.park_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);

  if exists {
    return Ok(());
  }

  // Timestamps come from the event, not the wall clock, so replaying the
  // log always produces identical rows.
  let time_str = encode_dt(fields.time);
  tx.execute(
    "INSERT INTO animals (
       animal_id, subject_id, park_id, name, species, gender,
       digestion_period_in_hours, herbivore, location_code, last_fed,
       active, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, 1, ?9, ?9)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      fields.subject_id,
      fields.park_id,
      fields.name,
      fields.species,
      fields.gender,
      fields.digestion_period_in_hours,
      fields.herbivore,
      time_str,
    ],
  )?;
  Ok(())
}

/// `dino_fed`: last-write-wins on `last_fed` by declared event time. A stale
/// or equal-time feed is accepted but changes nothing.
fn apply_fed(
  tx: &rusqlite::Transaction<'_>,
  subject_id: i64,
  park_id: i64,
  time: DateTime<Utc>,
) -> ApplyResult {
  let row: Option<(Option<String>, String)> = tx
    .query_row(
      "SELECT last_fed, updated_at FROM animals
       WHERE subject_id = ?1 AND park_id = ?2 AND active = 1",
      rusqlite::params![subject_id, park_id],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()?;

  let Some((last_fed_str, updated_at_str)) = row else {
    return Err(paddock_core::Error::AnimalNotFound(subject_id).into());
  };

  let last_fed = decode_opt_dt(last_fed_str.as_deref())?;
  let updated_at = decode_dt(&updated_at_str)?;

  if last_fed.is_some_and(|fed| time <= fed) {
    return Ok(());
  }

  let new_updated = if time > updated_at { time } else { updated_at };
  tx.execute(
    "UPDATE animals SET last_fed = ?3, updated_at = ?4
     WHERE subject_id = ?1 AND park_id = ?2 AND active = 1",
    rusqlite::params![subject_id, park_id, encode_dt(time), encode_dt(new_updated)],
  )?;
  Ok(())
}

/// `dino_location_updated`: last-write-wins on `location_code` guarded by
/// the row's `updated_at`, so a late-arriving stale move cannot clobber a
/// newer position. Distinguishes "invalid habitat" from "unknown animal".
fn apply_moved(
  tx: &rusqlite::Transaction<'_>,
  subject_id: i64,
  park_id: i64,
  time: DateTime<Utc>,
  location: &str,
) -> ApplyResult {
  if !habitat_exists(tx, location)? {
    return Err(paddock_core::Error::InvalidHabitat(location.to_owned()).into());
  }

  let updated_at_str: Option<String> = tx
    .query_row(
      "SELECT updated_at FROM animals
       WHERE subject_id = ?1 AND park_id = ?2 AND active = 1",
      rusqlite::params![subject_id, park_id],
      |r| r.get(0),
    )
    .optional()?;

  let Some(updated_at_str) = updated_at_str else {
    return Err(paddock_core::Error::AnimalNotFound(subject_id).into());
  };

  if time <= decode_dt(&updated_at_str)? {
    return Ok(());
  }

  tx.execute(
    "UPDATE animals SET location_code = ?3, updated_at = ?4
     WHERE subject_id = ?1 AND park_id = ?2 AND active = 1",
    rusqlite::params![subject_id, park_id, location, encode_dt(time)],
  )?;
  Ok(())
}

/// `dino_removed`: logical delete, terminal. Removing an already-inactive
/// (or never-created) subject is an error, surfaced with the same not-found
/// value since the feed cannot tell the two apart.
fn apply_removed(
  tx: &rusqlite::Transaction<'_>,
  subject_id: i64,
  park_id: i64,
  time: DateTime<Utc>,
) -> ApplyResult {
  let affected = tx.execute(
    "UPDATE animals SET active = 0, updated_at = ?3
     WHERE subject_id = ?1 AND park_id = ?2 AND active = 1",
    rusqlite::params![subject_id, park_id, encode_dt(time)],
  )?;

  if affected == 0 {
    return Err(paddock_core::Error::AnimalNotFound(subject_id).into());
  }
  Ok(())
}

/// `maintenance_performed`: append a record and set the habitat's
/// `last_maintenance` unconditionally — historical maintenance may be
/// logged deliberately, so no recency comparison here.
fn apply_maintenance(
  tx: &rusqlite::Transaction<'_>,
  location: &str,
  park_id: i64,
  time: DateTime<Utc>,
) -> ApplyResult {
  if !habitat_exists(tx, location)? {
    return Err(paddock_core::Error::InvalidHabitat(location.to_owned()).into());
  }

  let time_str = encode_dt(time);
  tx.execute(
    "INSERT INTO maintenance (maintenance_id, location_code, park_id, performed_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![encode_uuid(Uuid::new_v4()), location, park_id, time_str],
  )?;
  tx.execute(
    "UPDATE habitats SET last_maintenance = ?2 WHERE code = ?1",
    rusqlite::params![location, time_str],
  )?;
  Ok(())
}

fn habitat_exists(tx: &rusqlite::Transaction<'_>, code: &str) -> ApplyResult<bool> {
  Ok(
    tx.query_row(
      "SELECT 1 FROM habitats WHERE code = ?1",
      rusqlite::params![code],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false),
  )
}

// ─── ParkStore impl ──────────────────────────────────────────────────────────

const ANIMAL_COLUMNS: &str = "animal_id, subject_id, park_id, name, species, gender, \
   digestion_period_in_hours, herbivore, location_code, last_fed, active, \
   created_at, updated_at";

fn animal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAnimal> {
  Ok(RawAnimal {
    animal_id:                 row.get(0)?,
    subject_id:                row.get(1)?,
    park_id:                   row.get(2)?,
    name:                      row.get(3)?,
    species:                   row.get(4)?,
    gender:                    row.get(5)?,
    digestion_period_in_hours: row.get(6)?,
    herbivore:                 row.get(7)?,
    location_code:             row.get(8)?,
    last_fed:                  row.get(9)?,
    active:                    row.get(10)?,
    created_at:                row.get(11)?,
    updated_at:                row.get(12)?,
  })
}

impl ParkStore for SqliteStore {
  type Error = Error;

  // ── Event log ─────────────────────────────────────────────────────────────

  async fn record_event(&self, event: &FeedEvent) -> Result<RecordOutcome> {
    let kind = event.kind().as_str();
    let subject_id = event.subject_id();
    let park_id = event.park_id();
    let time_str = encode_dt(event.time());
    let location = event.location().map(str::to_owned);

    let (name, species, gender, digestion, herbivore) = match event {
      FeedEvent::DinoAdded {
        name,
        species,
        gender,
        digestion_period_in_hours,
        herbivore,
        ..
      } => (
        Some(name.clone()),
        Some(species.clone()),
        gender.clone(),
        *digestion_period_in_hours,
        *herbivore,
      ),
      _ => (None, None, None, None, None),
    };

    let raw = serde_json::to_string(event)?;
    let recorded_at = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO event_log (
             kind, subject_id, park_id, time, location, name, species,
             gender, digestion_period_in_hours, herbivore, raw_event,
             recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            kind, subject_id, park_id, time_str, location, name, species,
            gender, digestion, herbivore, raw, recorded_at,
          ],
        );

        match inserted {
          Ok(_) => Ok(RecordOutcome::Accepted(conn.last_insert_rowid())),
          // Only a unique-index hit is a duplicate; other constraint
          // failures (NOT NULL, CHECK) must surface as errors.
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(RecordOutcome::Duplicate)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(outcome)
  }

  async fn earliest_added_event(
    &self,
    subject_id: i64,
    park_id: i64,
  ) -> Result<Option<FeedEvent>> {
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT raw_event FROM event_log
               WHERE kind = 'dino_added' AND subject_id = ?1 AND park_id = ?2
               ORDER BY time ASC LIMIT 1",
              rusqlite::params![subject_id, park_id],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|json| {
        serde_json::from_str::<FeedEvent>(&json)
          .map_err(|e| Error::Core(paddock_core::Error::MalformedEvent(e.to_string())))
      })
      .transpose()
  }

  // ── Applier ───────────────────────────────────────────────────────────────

  async fn apply_event(&self, event: &FeedEvent) -> Result<()> {
    let event = event.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match apply_in_tx(&tx, &event) {
          Ok(()) => {
            tx.commit()?;
            Ok(Ok(()))
          }
          // Dropping the transaction rolls back every write for this event.
          Err(ApplyError::Fail(e)) => Ok(Err(e)),
          Err(ApplyError::Db(e)) => Err(e.into()),
        }
      })
      .await?
  }

  // ── Habitats ──────────────────────────────────────────────────────────────

  async fn add_habitat(&self, code: &str, park_id: i64) -> Result<Habitat> {
    let habitat = Habitat {
      habitat_id: Uuid::new_v4(),
      code: code.to_owned(),
      park_id,
      last_maintenance: None,
    };

    let id_str = encode_uuid(habitat.habitat_id);
    let code_owned = habitat.code.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO habitats (habitat_id, code, park_id, last_maintenance)
           VALUES (?1, ?2, ?3, NULL)",
          rusqlite::params![id_str, code_owned, park_id],
        )?;
        Ok(())
      })
      .await?;

    Ok(habitat)
  }

  async fn get_habitat(&self, code: &str) -> Result<Option<Habitat>> {
    let code_owned = code.to_owned();

    let raw: Option<RawHabitat> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT habitat_id, code, park_id, last_maintenance
               FROM habitats WHERE code = ?1",
              rusqlite::params![code_owned],
              |row| {
                Ok(RawHabitat {
                  habitat_id:       row.get(0)?,
                  code:             row.get(1)?,
                  park_id:          row.get(2)?,
                  last_maintenance: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHabitat::into_habitat).transpose()
  }

  async fn list_habitats(&self) -> Result<Vec<Habitat>> {
    let raws: Vec<RawHabitat> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT habitat_id, code, park_id, last_maintenance
           FROM habitats ORDER BY code",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawHabitat {
              habitat_id:       row.get(0)?,
              code:             row.get(1)?,
              park_id:          row.get(2)?,
              last_maintenance: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHabitat::into_habitat).collect()
  }

  // ── Animals ───────────────────────────────────────────────────────────────

  async fn get_animal(&self, subject_id: i64, park_id: i64) -> Result<Option<Animal>> {
    let raw: Option<RawAnimal> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ANIMAL_COLUMNS} FROM animals
           WHERE subject_id = ?1 AND park_id = ?2"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![subject_id, park_id], animal_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAnimal::into_animal).transpose()
  }

  async fn get_active_animal(&self, subject_id: i64) -> Result<Option<Animal>> {
    let raw: Option<RawAnimal> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ANIMAL_COLUMNS} FROM animals
           WHERE subject_id = ?1 AND active = 1 LIMIT 1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![subject_id], animal_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAnimal::into_animal).transpose()
  }

  async fn list_animals(&self, active_only: bool) -> Result<Vec<Animal>> {
    let raws: Vec<RawAnimal> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE active = 1 ORDER BY subject_id")
        } else {
          format!("SELECT {ANIMAL_COLUMNS} FROM animals ORDER BY subject_id")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], animal_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnimal::into_animal).collect()
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn list_maintenance(&self, code: &str, limit: usize) -> Result<Vec<MaintenanceRecord>> {
    let code_owned = code.to_owned();
    let limit = limit as i64;

    let raws: Vec<RawMaintenance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT maintenance_id, location_code, park_id, performed_at
           FROM maintenance WHERE location_code = ?1
           ORDER BY performed_at DESC LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![code_owned, limit], |row| {
            Ok(RawMaintenance {
              maintenance_id: row.get(0)?,
              location_code:  row.get(1)?,
              park_id:        row.get(2)?,
              performed_at:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMaintenance::into_record).collect()
  }
}
