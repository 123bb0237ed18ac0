//! Handler for `GET /park/status` — the cached aggregate view.

use axum::{Json, extract::State};
use chrono::Utc;
use paddock_core::{
  cache::PARK_STATUS_KEY,
  status::{ParkStatus, compute_park_status},
  store::ParkStore,
};

use crate::{AppState, error::ApiError};

/// `GET /park/status`
///
/// Serves the cached view when fresh; otherwise recomputes from the
/// habitat and active-animal projections and repopulates the cache. Two
/// consecutive reads with no intervening committed event return the
/// identical cached value.
pub async fn status<S>(State(state): State<AppState<S>>) -> Result<Json<ParkStatus>, ApiError>
where
  S: ParkStore,
{
  if let Some(cached) = state.cache.get(PARK_STATUS_KEY) {
    return Ok(Json(cached));
  }

  let habitats = state.store.list_habitats().await.map_err(ApiError::store)?;
  let animals = state
    .store
    .list_animals(true)
    .await
    .map_err(ApiError::store)?;

  let status = compute_park_status(&habitats, &animals, Utc::now());
  state.cache.set(PARK_STATUS_KEY, status.clone());
  Ok(Json(status))
}
