//! Handlers for `/habitats` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/habitats` | All habitats with recent maintenance history |
//! | `GET`  | `/habitats/:code` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use paddock_core::{
  habitat::{Habitat, MaintenanceRecord},
  store::ParkStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// How many recent maintenance records accompany each habitat.
const HISTORY_LIMIT: usize = 5;

/// A habitat with its most recent maintenance records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitatDetail {
  #[serde(flatten)]
  pub habitat:             Habitat,
  pub maintenance_history: Vec<MaintenanceRecord>,
}

/// `GET /habitats`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<HabitatDetail>>, ApiError>
where
  S: ParkStore,
{
  let habitats = state.store.list_habitats().await.map_err(ApiError::store)?;

  let mut details = Vec::with_capacity(habitats.len());
  for habitat in habitats {
    let maintenance_history = state
      .store
      .list_maintenance(&habitat.code, HISTORY_LIMIT)
      .await
      .map_err(ApiError::store)?;
    details.push(HabitatDetail { habitat, maintenance_history });
  }

  Ok(Json(details))
}

/// `GET /habitats/:code`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
) -> Result<Json<HabitatDetail>, ApiError>
where
  S: ParkStore,
{
  let habitat = state
    .store
    .get_habitat(&code)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("habitat {code} not found")))?;

  let maintenance_history = state
    .store
    .list_maintenance(&code, HISTORY_LIMIT)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(HabitatDetail { habitat, maintenance_history }))
}
