//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its JSON body or path parameter, calls the store or
//! the import saga, and maps the outcome to a JSON response.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use cadence_import::{ImportRequest, SimilarTarget};
use cadence_vector::{KeyValueFilter, MetadataFilter, SearchParams};

use crate::dto::{
    requested_k, to_items, HealthResponse, ImportRequestBody, ImportResponse, InsertRequest,
    InsertResponse, SearchByIdRequest, SearchRequest, SearchResponse, SongResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Build an equality filter, or none for a missing or empty map.
fn build_filter(filter: Option<HashMap<String, String>>) -> Option<KeyValueFilter> {
    filter
        .filter(|pairs| !pairs.is_empty())
        .map(KeyValueFilter::from)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        song_count: state.store.count(),
        embedding_dim: state.store.dimension(),
    })
}

/// POST /api/v1/songs - store a song under a generated id.
pub async fn insert_song(
    State(state): State<AppState>,
    payload: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InsertResponse>), ApiError> {
    let Json(body) = payload?;
    let song = state.store.insert(body.embedding, body.metadata)?;
    info!(song_id = %song.id, "Song inserted");
    Ok((
        StatusCode::CREATED,
        Json(InsertResponse {
            id: song.id.clone(),
        }),
    ))
}

/// POST /api/v1/songs/search - KNN search by embedding.
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(body) = payload?;
    let k = state.config.search.resolve_k(requested_k(body.k));
    let filter = build_filter(body.filter);

    let mut params = SearchParams::new(&body.embedding).with_k(k);
    if let Some(ref filter) = filter {
        params = params.with_filter(filter);
    }
    let results = state.store.search(params)?;

    Ok(Json(SearchResponse {
        results: to_items(&results),
    }))
}

/// POST /api/v1/songs/search/by-id - songs similar to a stored song.
pub async fn search_by_id(
    State(state): State<AppState>,
    payload: Result<Json<SearchByIdRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(body) = payload?;
    let k = state.config.search.resolve_k(requested_k(body.k));
    let filter = build_filter(body.filter);

    let results = state
        .store
        .search_by_id(&body.id, k, filter.as_ref().map(|f| f as &dyn MetadataFilter))?
        .ok_or_else(|| ApiError::NotFound(format!("Song '{}' not found", body.id)))?;

    Ok(Json(SearchResponse {
        results: to_items(&results),
    }))
}

/// GET /api/v1/songs/{id}
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SongResponse>, ApiError> {
    let song = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Song '{}' not found", id)))?;
    Ok(Json(SongResponse::from(song.as_ref())))
}

/// DELETE /api/v1/songs/{id}
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete(&id) {
        info!(song_id = %id, "Song deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Song '{}' not found", id)))
    }
}

/// POST /api/v1/songs/import - bulk import from the track service.
pub async fn import_songs(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequestBody>, JsonRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
    let Json(body) = payload?;
    let importer = state.importer.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("No track service configured for import".to_string())
    })?;

    if body.track_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "'track_ids' must not be empty".to_string(),
        ));
    }

    let request = ImportRequest {
        track_ids: body.track_ids,
        find_similar_to: body.find_similar_to.as_deref().and_then(SimilarTarget::parse),
        k: state.config.search.resolve_k(requested_k(body.k)),
    };
    let outcome = importer.run(request).await?;

    Ok(Json(ImportResponse {
        imported: outcome.imported,
        failed: outcome.failed,
        similar: outcome.similar.as_deref().map(to_items),
    }))
}
