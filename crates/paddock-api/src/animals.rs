//! Handlers for `/dinosaurs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dinosaurs` | Active animals only |
//! | `GET`  | `/dinosaurs/:id` | By subject id; 404 if absent or removed |

use axum::{
  Json,
  extract::{Path, State},
};
use paddock_core::{animal::Animal, store::ParkStore};

use crate::{AppState, error::ApiError};

/// `GET /dinosaurs`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Animal>>, ApiError>
where
  S: ParkStore,
{
  let animals = state
    .store
    .list_animals(true)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(animals))
}

/// `GET /dinosaurs/:id` — `id` is the feed's subject id, not the surrogate
/// key. Removed animals are indistinguishable from never-created ones.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Animal>, ApiError>
where
  S: ParkStore,
{
  let animal = state
    .store
    .get_active_animal(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("dinosaur {id} not found")))?;
  Ok(Json(animal))
}
