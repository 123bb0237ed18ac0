//! JSON REST API for paddock.
//!
//! Exposes a read-only axum [`Router`] backed by any
//! [`paddock_core::store::ParkStore`]. All reconciliation happens on the
//! write path (`paddock-feed`); these handlers only project current state,
//! with the park-status view served through the shared TTL cache.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(paddock_api::api_router(state))
//! ```

pub mod animals;
pub mod error;
pub mod habitats;
pub mod park;

use std::sync::Arc;

use axum::{Router, routing::get};
use paddock_core::{cache::TtlCache, status::ParkStatus, store::ParkStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
///
/// The cache is the same instance the poller invalidates; handler reads and
/// poller writes meet only here.
#[derive(Clone)]
pub struct AppState<S: ParkStore> {
  pub store: Arc<S>,
  pub cache: Arc<TtlCache<ParkStatus>>,
}

/// Build a fully-materialised API router for `state`.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ParkStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/park/status", get(park::status::<S>))
    .route("/dinosaurs", get(animals::list::<S>))
    .route("/dinosaurs/{id}", get(animals::get_one::<S>))
    .route("/habitats", get(habitats::list::<S>))
    .route("/habitats/{code}", get(habitats::get_one::<S>))
    .with_state(state)
}
