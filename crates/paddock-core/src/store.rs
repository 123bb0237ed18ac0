//! The `ParkStore` trait — the seam between the reconciliation pipeline and
//! its storage backend.
//!
//! The trait is implemented by storage backends (e.g.
//! `paddock-store-sqlite`). Higher layers (`paddock-feed`, `paddock-api`)
//! depend on this abstraction, not on any concrete backend.
//!
//! The event log is the system of record; the animal/habitat/maintenance
//! rows this trait exposes are a materialized projection the applier derives
//! from it. Log writes are append-only and deduplicated; `apply_event` is
//! one atomic transaction per event.

use std::future::Future;

use crate::{
  ClassifyError,
  animal::Animal,
  event::FeedEvent,
  habitat::{Habitat, MaintenanceRecord},
};

// ─── Record outcome ──────────────────────────────────────────────────────────

/// Result of appending one raw event to the log.
///
/// `Duplicate` is an expected, silently-absorbed outcome of re-delivery —
/// never an error. Two deliveries of the identical event are
/// indistinguishable and only the first is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
  /// Newly persisted, with the log's surrogate row id.
  Accepted(i64),
  /// An entry with the same `(kind, subject, park, time)` dedup key already
  /// exists; nothing was written.
  Duplicate,
}

impl RecordOutcome {
  pub fn is_duplicate(&self) -> bool {
    matches!(self, Self::Duplicate)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a paddock storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait ParkStore: Send + Sync {
  type Error: std::error::Error + ClassifyError + Send + Sync + 'static;

  // ── Event log ─────────────────────────────────────────────────────────

  /// Append `event` to the log, preserving the original payload verbatim.
  /// Reports [`RecordOutcome::Duplicate`] instead of failing when the dedup
  /// key is already present.
  fn record_event<'a>(
    &'a self,
    event: &'a FeedEvent,
  ) -> impl Future<Output = Result<RecordOutcome, Self::Error>> + Send + 'a;

  /// Read-only lookup of the earliest logged `dino_added` event for a
  /// subject, decoded from its preserved payload. Used by the causal
  /// resolver to backfill missing prerequisites; never mutates the log.
  fn earliest_added_event(
    &self,
    subject_id: i64,
    park_id: i64,
  ) -> impl Future<Output = Result<Option<FeedEvent>, Self::Error>> + Send + '_;

  // ── Applier ───────────────────────────────────────────────────────────

  /// Apply one event to the projections in a single atomic transaction:
  /// either all writes for the event commit, or none do. Idempotent for
  /// `dino_added`; last-write-wins by event time for `dino_fed` and
  /// `dino_location_updated`. The event's log entry (if any) survives a
  /// failed application.
  fn apply_event<'a>(
    &'a self,
    event: &'a FeedEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Habitats ──────────────────────────────────────────────────────────

  /// Create a habitat with the given unique code. Used by seeding and
  /// tests; habitats never arrive through the feed.
  fn add_habitat<'a>(
    &'a self,
    code: &'a str,
    park_id: i64,
  ) -> impl Future<Output = Result<Habitat, Self::Error>> + Send + 'a;

  fn get_habitat<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Habitat>, Self::Error>> + Send + 'a;

  fn list_habitats(
    &self,
  ) -> impl Future<Output = Result<Vec<Habitat>, Self::Error>> + Send + '_;

  // ── Animals ───────────────────────────────────────────────────────────

  /// Fetch the animal projection for a feed identity, active or not.
  fn get_animal(
    &self,
    subject_id: i64,
    park_id: i64,
  ) -> impl Future<Output = Result<Option<Animal>, Self::Error>> + Send + '_;

  /// Park-agnostic point lookup of an active animal by its feed subject id.
  /// Serves the read API's by-id endpoint; removed animals are absent.
  fn get_active_animal(
    &self,
    subject_id: i64,
  ) -> impl Future<Output = Result<Option<Animal>, Self::Error>> + Send + '_;

  /// List animal projections, optionally restricted to active rows.
  fn list_animals(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Animal>, Self::Error>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Most recent maintenance records for a habitat, newest first.
  fn list_maintenance<'a>(
    &'a self,
    code: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MaintenanceRecord>, Self::Error>> + Send + 'a;
}
