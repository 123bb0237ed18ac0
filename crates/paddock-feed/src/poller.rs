//! The poll-cycle driver: record, sequence, resolve, apply.

use std::{sync::Arc, time::Duration};

use paddock_core::{
  ClassifyError, ErrorClass,
  cache::{PARK_STATUS_KEY, TtlCache},
  event::FeedEvent,
  status::ParkStatus,
  store::ParkStore,
};
use thiserror::Error;
use tokio::time::MissedTickBehavior;

use crate::source::{FeedSource, FetchError};

/// Consecutive storage failures after which a cycle is abandoned. Domain
/// failures (not-found, validation) never count — they are per-event and
/// expected under out-of-order delivery.
const MAX_CONSECUTIVE_STORAGE_FAILURES: usize = 3;

// ─── Errors & summary ────────────────────────────────────────────────────────

/// A whole-cycle failure. Per-event failures are absorbed into
/// [`CycleSummary::failed`] instead.
#[derive(Debug, Error)]
pub enum PollError<E: std::error::Error> {
  #[error("feed fetch failed: {0}")]
  Fetch(#[from] FetchError),

  #[error("cycle abandoned after repeated storage failures: {0}")]
  StorageAborted(E),
}

/// Counters for one completed poll cycle, logged at INFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
  pub fetched:    usize,
  /// Newly logged this cycle; the only events that reach the applier.
  pub accepted:   usize,
  pub duplicates: usize,
  pub applied:    usize,
  pub failed:     usize,
}

// ─── Poller ──────────────────────────────────────────────────────────────────

/// Drives poll cycles: fetch a snapshot, log every event (duplicates are
/// silently dropped), order the newly accepted ones so creations come
/// first, then feed each through causal resolution and the applier.
///
/// Events within a cycle are applied strictly sequentially — later events
/// may depend on earlier ones, and transactions serialise against shared
/// rows. Cycles never overlap: `run` awaits each cycle to completion before
/// the next tick.
pub struct Poller<S, F> {
  store:  Arc<S>,
  source: F,
  cache:  Arc<TtlCache<ParkStatus>>,
}

impl<S, F> Poller<S, F>
where
  S: ParkStore,
  F: FeedSource,
{
  pub fn new(store: Arc<S>, source: F, cache: Arc<TtlCache<ParkStatus>>) -> Self {
    Self { store, source, cache }
  }

  /// Poll forever on a fixed interval. Cycle failures are logged, never
  /// fatal; the next tick starts fresh.
  pub async fn run(&self, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // Skip missed ticks instead of bursting; a slow cycle must not cause
    // overlapping application of the same subjects.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;
      match self.run_once().await {
        Ok(summary) => tracing::info!(
          fetched = summary.fetched,
          accepted = summary.accepted,
          duplicates = summary.duplicates,
          applied = summary.applied,
          failed = summary.failed,
          "poll cycle complete"
        ),
        Err(e) => tracing::error!(error = %e, "poll cycle failed"),
      }
    }
  }

  /// Run a single poll cycle to completion.
  pub async fn run_once(&self) -> Result<CycleSummary, PollError<S::Error>> {
    let events = self.source.fetch().await?;
    let mut summary = CycleSummary {
      fetched: events.len(),
      ..CycleSummary::default()
    };

    // Log everything first; only events newly accepted this cycle are
    // processed further. The abort counter tracks strictly consecutive
    // storage failures: any success resets it.
    let mut storage_failures = 0usize;
    let mut accepted: Vec<FeedEvent> = Vec::with_capacity(events.len());
    for event in events {
      match self.store.record_event(&event).await {
        Ok(outcome) if outcome.is_duplicate() => {
          summary.duplicates += 1;
          storage_failures = 0;
        }
        Ok(_) => {
          accepted.push(event);
          storage_failures = 0;
        }
        Err(e) => {
          summary.failed += 1;
          storage_failures += 1;
          tracing::error!(kind = %event.kind(), error = %e, "failed to log event");
          if storage_failures >= MAX_CONSECUTIVE_STORAGE_FAILURES {
            return Err(PollError::StorageAborted(e));
          }
        }
      }
    }
    summary.accepted = accepted.len();

    // Stable partial order: every creation precedes all non-creations;
    // relative order within each class is preserved from the feed.
    accepted.sort_by_key(|e| !e.is_creation());

    // Each phase gets its own consecutive count; trailing record failures
    // must not pre-charge the apply loop.
    let mut storage_failures = 0usize;

    for event in &accepted {
      match self.apply_with_backfill(event).await {
        Ok(()) => {
          summary.applied += 1;
          storage_failures = 0;
        }
        Err(e) => {
          summary.failed += 1;
          match e.class() {
            ErrorClass::Storage => {
              storage_failures += 1;
              tracing::error!(
                kind = %event.kind(),
                subject = ?event.subject_id(),
                time = %event.time(),
                error = %e,
                "storage failure applying event"
              );
              if storage_failures >= MAX_CONSECUTIVE_STORAGE_FAILURES {
                return Err(PollError::StorageAborted(e));
              }
            }
            // Recoverable: the event stays in the log as a durable
            // unresolved no-op; it is not retried automatically.
            ErrorClass::NotFound | ErrorClass::Validation => tracing::warn!(
              kind = %event.kind(),
              subject = ?event.subject_id(),
              time = %event.time(),
              error = %e,
              "skipping event"
            ),
          }
        }
      }
    }

    Ok(summary)
  }

  /// Causal resolution plus application for one event.
  ///
  /// A dependent event whose subject has no projection yet triggers a
  /// single-level backfill: the earliest logged creation for that subject
  /// is applied first (idempotently). Creations have no prerequisites of
  /// their own, so this never recurses. The log itself is only read.
  ///
  /// The cache is invalidated after every commit — including a backfilled
  /// prerequisite — and never on failure, since nothing changed.
  async fn apply_with_backfill(&self, event: &FeedEvent) -> Result<(), S::Error> {
    if !event.is_creation()
      && let Some(subject_id) = event.subject_id()
      && self.store.get_animal(subject_id, event.park_id()).await?.is_none()
      && let Some(prerequisite) = self
        .store
        .earliest_added_event(subject_id, event.park_id())
        .await?
    {
      self.store.apply_event(&prerequisite).await?;
      self.cache.invalidate(PARK_STATUS_KEY);
      tracing::debug!(subject = subject_id, "backfilled missing creation event");
    }

    self.store.apply_event(event).await?;
    self.cache.invalidate(PARK_STATUS_KEY);
    Ok(())
  }
}
