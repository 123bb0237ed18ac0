//! SQL schema for the paddock SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS habitats (
    habitat_id       TEXT PRIMARY KEY,
    code             TEXT NOT NULL UNIQUE,
    park_id          INTEGER NOT NULL,
    last_maintenance TEXT               -- ISO 8601 UTC or NULL (never)
);

CREATE TABLE IF NOT EXISTS animals (
    animal_id                 TEXT PRIMARY KEY,
    subject_id                INTEGER NOT NULL,  -- the feed's stable id
    park_id                   INTEGER NOT NULL,
    name                      TEXT NOT NULL,
    species                   TEXT NOT NULL,
    gender                    TEXT,
    digestion_period_in_hours INTEGER,
    herbivore                 INTEGER,           -- 0/1 or NULL (unknown)
    location_code             TEXT,
    last_fed                  TEXT,
    active                    INTEGER NOT NULL DEFAULT 1,
    created_at                TEXT NOT NULL,     -- event time, not wall clock
    updated_at                TEXT NOT NULL,
    UNIQUE (subject_id, park_id)
);

-- Maintenance entries are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS maintenance (
    maintenance_id TEXT PRIMARY KEY,
    location_code  TEXT NOT NULL,
    park_id        INTEGER NOT NULL,
    performed_at   TEXT NOT NULL
);

-- The event log is the system of record. Append-only, immutable once
-- written; rows survive failed applications for inspection and replay.
CREATE TABLE IF NOT EXISTS event_log (
    log_id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    kind                      TEXT NOT NULL,
    subject_id                INTEGER,
    park_id                   INTEGER NOT NULL,
    time                      TEXT NOT NULL,
    location                  TEXT,
    name                      TEXT,
    species                   TEXT,
    gender                    TEXT,
    digestion_period_in_hours INTEGER,
    herbivore                 INTEGER,
    raw_event                 TEXT NOT NULL,     -- full original payload
    recorded_at               TEXT NOT NULL
);

-- The dedup key. subject_id is coalesced because SQLite treats NULLs as
-- distinct in unique indexes, and subject-less events (maintenance) must
-- deduplicate too.
CREATE UNIQUE INDEX IF NOT EXISTS event_log_dedup_idx
    ON event_log (kind, COALESCE(subject_id, -1), park_id, time);

CREATE INDEX IF NOT EXISTS event_log_subject_idx ON event_log (subject_id, park_id);
CREATE INDEX IF NOT EXISTS animals_location_idx  ON animals (location_code);
CREATE INDEX IF NOT EXISTS maintenance_code_idx  ON maintenance (location_code);

PRAGMA user_version = 1;
";
