//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, Utc};
use paddock_core::{
  ClassifyError, ErrorClass,
  event::FeedEvent,
  store::{ParkStore, RecordOutcome},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");
  s.add_habitat("A1", 1).await.unwrap();
  s
}

fn added(subject_id: i64, time: DateTime<Utc>) -> FeedEvent {
  FeedEvent::DinoAdded {
    id: subject_id,
    park_id: 1,
    time,
    name: "Rex".into(),
    species: "T-Rex".into(),
    gender: Some("male".into()),
    digestion_period_in_hours: Some(48),
    herbivore: Some(false),
  }
}

fn fed(subject_id: i64, time: DateTime<Utc>) -> FeedEvent {
  FeedEvent::DinoFed { dinosaur_id: subject_id, park_id: 1, time }
}

fn moved(subject_id: i64, location: &str, time: DateTime<Utc>) -> FeedEvent {
  FeedEvent::DinoLocationUpdated {
    dinosaur_id: subject_id,
    park_id: 1,
    time,
    location: location.into(),
  }
}

fn removed(subject_id: i64, time: DateTime<Utc>) -> FeedEvent {
  FeedEvent::DinoRemoved { dinosaur_id: subject_id, park_id: 1, time }
}

fn maintenance(location: &str, time: DateTime<Utc>) -> FeedEvent {
  FeedEvent::MaintenancePerformed { location: location.into(), park_id: 1, time }
}

// ─── Event log dedup ─────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_event_is_rejected_at_the_log() {
  let s = store().await;
  let event = fed(1, Utc::now());

  let first = s.record_event(&event).await.unwrap();
  assert!(matches!(first, RecordOutcome::Accepted(_)));

  let second = s.record_event(&event).await.unwrap();
  assert!(second.is_duplicate());
}

#[tokio::test]
async fn subjectless_events_deduplicate_too() {
  let s = store().await;
  let event = maintenance("A1", Utc::now());

  assert!(!s.record_event(&event).await.unwrap().is_duplicate());
  assert!(s.record_event(&event).await.unwrap().is_duplicate());
}

#[tokio::test]
async fn same_subject_different_times_both_accepted() {
  let s = store().await;
  let now = Utc::now();

  let first = s.record_event(&fed(1, now)).await.unwrap();
  let second = s.record_event(&fed(1, now + Duration::hours(1))).await.unwrap();
  assert!(!first.is_duplicate());
  assert!(!second.is_duplicate());
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn added_creates_active_animal_with_event_timestamps() {
  let s = store().await;
  let t = Utc::now() - Duration::days(3);

  s.apply_event(&added(1, t)).await.unwrap();

  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert!(animal.active);
  assert_eq!(animal.name, "Rex");
  assert_eq!(animal.created_at, t);
  assert_eq!(animal.updated_at, t);
  assert!(animal.location_code.is_none());
  assert!(animal.last_fed.is_none());
}

#[tokio::test]
async fn added_is_idempotent() {
  let s = store().await;
  let t = Utc::now();

  s.apply_event(&added(1, t)).await.unwrap();
  let before = s.get_animal(1, 1).await.unwrap().unwrap();

  // Re-applying the creation (e.g. during causal backfill) is a no-op.
  s.apply_event(&added(1, t + Duration::hours(5))).await.unwrap();
  let after = s.get_animal(1, 1).await.unwrap().unwrap();

  assert_eq!(before, after);
}

// ─── Feeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feeding_updates_last_fed() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(4);
  let t1 = t0 + Duration::hours(1);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&fed(1, t1)).await.unwrap();

  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert_eq!(animal.last_fed, Some(t1));
  assert_eq!(animal.updated_at, t1);
}

#[tokio::test]
async fn stale_feed_event_is_an_accepted_no_op() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(4);
  let newer = t0 + Duration::hours(2);
  let older = t0 + Duration::hours(1);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&fed(1, newer)).await.unwrap();
  // The stale event succeeds but changes nothing.
  s.apply_event(&fed(1, older)).await.unwrap();

  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert_eq!(animal.last_fed, Some(newer));
}

#[tokio::test]
async fn feed_monotonicity_holds_in_either_order() {
  let t0 = Utc::now() - Duration::hours(6);
  let t1 = t0 + Duration::hours(1);
  let t2 = t0 + Duration::hours(2);

  for order in [[t1, t2], [t2, t1]] {
    let s = store().await;
    s.apply_event(&added(1, t0)).await.unwrap();
    for t in order {
      s.apply_event(&fed(1, t)).await.unwrap();
    }
    let animal = s.get_animal(1, 1).await.unwrap().unwrap();
    assert_eq!(animal.last_fed, Some(t2));
  }
}

#[tokio::test]
async fn feeding_unknown_animal_fails_not_found() {
  let s = store().await;
  let err = s.apply_event(&fed(99, Utc::now())).await.unwrap_err();
  assert!(matches!(err, Error::Core(paddock_core::Error::AnimalNotFound(99))));
  assert_eq!(err.class(), ErrorClass::NotFound);
}

// ─── Movement ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn moving_assigns_habitat() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(2);
  let t1 = t0 + Duration::hours(1);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&moved(1, "A1", t1)).await.unwrap();

  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert_eq!(animal.location_code.as_deref(), Some("A1"));
  assert_eq!(animal.updated_at, t1);
}

#[tokio::test]
async fn move_monotonicity_holds_in_either_order() {
  let t0 = Utc::now() - Duration::hours(6);
  let t1 = t0 + Duration::hours(1);
  let t2 = t0 + Duration::hours(2);

  for (first, second) in [((t1, "A1"), (t2, "B1")), ((t2, "B1"), (t1, "A1"))] {
    let s = store().await;
    s.add_habitat("B1", 1).await.unwrap();
    s.apply_event(&added(1, t0)).await.unwrap();
    s.apply_event(&moved(1, first.1, first.0)).await.unwrap();
    s.apply_event(&moved(1, second.1, second.0)).await.unwrap();

    let animal = s.get_animal(1, 1).await.unwrap().unwrap();
    assert_eq!(animal.location_code.as_deref(), Some("B1"));
    assert_eq!(animal.updated_at, t2);
  }
}

#[tokio::test]
async fn moving_to_unknown_habitat_fails_and_changes_nothing() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(2);

  s.apply_event(&added(1, t0)).await.unwrap();
  let err = s
    .apply_event(&moved(1, "NOPE", t0 + Duration::hours(1)))
    .await
    .unwrap_err();

  assert!(
    matches!(&err, Error::Core(paddock_core::Error::InvalidHabitat(code)) if code == "NOPE")
  );
  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert!(animal.location_code.is_none());
  assert_eq!(animal.updated_at, t0);
}

#[tokio::test]
async fn moving_unknown_animal_names_the_animal_not_the_habitat() {
  let s = store().await;
  let err = s.apply_event(&moved(7, "A1", Utc::now())).await.unwrap_err();
  assert!(matches!(err, Error::Core(paddock_core::Error::AnimalNotFound(7))));
}

// ─── Removal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn removal_deactivates_and_is_terminal() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(3);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&removed(1, t0 + Duration::hours(1))).await.unwrap();

  let animal = s.get_animal(1, 1).await.unwrap().unwrap();
  assert!(!animal.active);

  // Removing again reports not-found; the record stays, inactive.
  let err = s
    .apply_event(&removed(1, t0 + Duration::hours(2)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(paddock_core::Error::AnimalNotFound(1))));
}

#[tokio::test]
async fn inactive_animals_are_excluded_from_active_listing() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(3);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&added(2, t0)).await.unwrap();
  s.apply_event(&removed(1, t0 + Duration::hours(1))).await.unwrap();

  let active = s.list_animals(true).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].subject_id, 2);

  let all = s.list_animals(false).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn get_active_animal_ignores_inactive_rows() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(3);

  s.apply_event(&added(1, t0)).await.unwrap();
  let found = s.get_active_animal(1).await.unwrap().unwrap();
  assert_eq!(found.subject_id, 1);

  s.apply_event(&removed(1, t0 + Duration::hours(1))).await.unwrap();
  assert!(s.get_active_animal(1).await.unwrap().is_none());
  assert!(s.get_active_animal(99).await.unwrap().is_none());
}

#[tokio::test]
async fn events_against_removed_animal_fail_not_found() {
  let s = store().await;
  let t0 = Utc::now() - Duration::hours(3);

  s.apply_event(&added(1, t0)).await.unwrap();
  s.apply_event(&removed(1, t0 + Duration::hours(1))).await.unwrap();

  let err = s
    .apply_event(&fed(1, t0 + Duration::hours(2)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(paddock_core::Error::AnimalNotFound(1))));
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn maintenance_appends_record_and_updates_habitat() {
  let s = store().await;
  let t = Utc::now() - Duration::days(1);

  s.apply_event(&maintenance("A1", t)).await.unwrap();

  let habitat = s.get_habitat("A1").await.unwrap().unwrap();
  assert_eq!(habitat.last_maintenance, Some(t));

  let records = s.list_maintenance("A1", 5).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].performed_at, t);
}

#[tokio::test]
async fn maintenance_time_is_not_compared_for_recency() {
  let s = store().await;
  let newer = Utc::now() - Duration::days(1);
  let older = Utc::now() - Duration::days(10);

  s.apply_event(&maintenance("A1", newer)).await.unwrap();
  // Historical maintenance may be logged deliberately; the habitat's
  // timestamp follows the event unconditionally.
  s.apply_event(&maintenance("A1", older)).await.unwrap();

  let habitat = s.get_habitat("A1").await.unwrap().unwrap();
  assert_eq!(habitat.last_maintenance, Some(older));
  assert_eq!(s.list_maintenance("A1", 5).await.unwrap().len(), 2);
}

#[tokio::test]
async fn maintenance_on_unknown_habitat_fails_and_writes_nothing() {
  let s = store().await;
  let err = s.apply_event(&maintenance("NOPE", Utc::now())).await.unwrap_err();

  assert!(
    matches!(&err, Error::Core(paddock_core::Error::InvalidHabitat(code)) if code == "NOPE")
  );
  assert!(s.list_maintenance("NOPE", 5).await.unwrap().is_empty());
}

// ─── Log queries ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn earliest_added_event_picks_the_oldest() {
  let s = store().await;
  let early = Utc::now() - Duration::days(2);
  let late = Utc::now() - Duration::days(1);

  // Logged newest-first; lookup must still return the earliest by time.
  s.record_event(&added(1, late)).await.unwrap();
  s.record_event(&added(1, early)).await.unwrap();

  let found = s.earliest_added_event(1, 1).await.unwrap().unwrap();
  assert_eq!(found.time(), early);
  assert!(found.is_creation());
}

#[tokio::test]
async fn earliest_added_event_missing_returns_none() {
  let s = store().await;
  s.record_event(&fed(1, Utc::now())).await.unwrap();
  assert!(s.earliest_added_event(1, 1).await.unwrap().is_none());
}

// ─── Habitats ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn habitats_list_in_code_order() {
  let s = store().await;
  s.add_habitat("B2", 1).await.unwrap();
  s.add_habitat("A2", 1).await.unwrap();

  let habitats = s.list_habitats().await.unwrap();
  let codes: Vec<_> = habitats.iter().map(|h| h.code.as_str()).collect();
  assert_eq!(codes, ["A1", "A2", "B2"]);
}

#[tokio::test]
async fn get_habitat_missing_returns_none() {
  let s = store().await;
  assert!(s.get_habitat("Z9").await.unwrap().is_none());
}
