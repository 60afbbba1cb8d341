//! JSON API route handlers.
//!
//! Store search for the header autocomplete, proximity lookup for the map,
//! and the heart toggle.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use storefinder_core::{GeoPoint, StoreId};

use super::views::StoreSummary;
use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Maximum results returned by the search endpoint.
pub const SEARCH_LIMIT: i64 = 5;

/// Radius of the proximity search, in meters.
pub const NEAR_RADIUS_METERS: f64 = 10_000.0;

/// Maximum results returned by the proximity endpoint.
pub const NEAR_LIMIT: i64 = 10;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Proximity query parameters.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Heart toggle response.
#[derive(Debug, Serialize)]
pub struct HeartResponse {
    /// Whether the store is hearted after the toggle.
    pub hearted: bool,
    /// Every store the user has hearted.
    pub hearts: Vec<StoreId>,
}

/// Full-text store search, best matches first.
///
/// GET /api/search?q=
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StoreSummary>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let stores = StoreRepository::new(state.pool())
        .search(q, SEARCH_LIMIT)
        .await?;

    Ok(Json(stores.into_iter().map(StoreSummary::from).collect()))
}

/// Stores within [`NEAR_RADIUS_METERS`] of a point, nearest first.
///
/// GET /api/stores/near?lat=&lng=
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<StoreSummary>>> {
    let point =
        GeoPoint::new(query.lng, query.lat).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let stores = StoreRepository::new(state.pool())
        .near(point, NEAR_RADIUS_METERS, NEAR_LIMIT)
        .await?;

    Ok(Json(
        stores
            .into_iter()
            .map(|(store, _distance)| StoreSummary::from(store))
            .collect(),
    ))
}

/// Heart or un-heart a store for the current user.
///
/// POST /api/stores/{id}/heart
#[instrument(skip_all, fields(user_id = %user.id, store_id = %store_id))]
pub async fn toggle_heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(store_id): Path<StoreId>,
) -> Result<Json<HeartResponse>> {
    let users = UserRepository::new(state.pool());

    let hearted = users
        .toggle_heart(user.id, store_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("store {store_id}")),
            other => AppError::Database(other),
        })?;
    let hearts = users.heart_ids(user.id).await?;

    tracing::info!(hearted, "Heart toggled");
    Ok(Json(HeartResponse { hearted, hearts }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_defaults_to_empty() {
        let query: SearchQuery = serde_json::from_str("{}").unwrap();
        assert!(query.q.is_empty());
    }

    #[test]
    fn test_typeahead_empty_results_message() {
        let script = include_str!("../../static/js/typeahead.js");
        assert!(script.contains("No results for ${escapeHtml(query)}</div>"));
        assert!(script.contains("/api/search?q="));
    }

    #[test]
    fn test_heart_response_json() {
        let json = serde_json::to_value(HeartResponse {
            hearted: true,
            hearts: vec![StoreId::new(3), StoreId::new(9)],
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "hearted": true, "hearts": [3, 9] }));
    }
}
