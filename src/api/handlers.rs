//! Country endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::state::AppState;
use crate::error::Error;
use crate::model::CountryRecord;
use crate::store::CountryFilter;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub total_countries: u64,
    pub last_refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

/// POST /countries/refresh
pub async fn refresh_countries(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.refresher.run().await?;

    Ok(Json(RefreshResponse {
        message: "Countries refreshed successfully".to_string(),
        total_countries: outcome.total_countries,
        last_refreshed_at: outcome.last_refreshed_at,
    }))
}

/// GET /countries?region=&currency=&sort=
pub async fn list_countries(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<CountryRecord>>> {
    // Malformed query strings get the same JSON error shape as bad values
    let Query(params) = query.map_err(|rejection| Error::Validation {
        field: "query",
        message: rejection.body_text(),
    })?;
    let filter = CountryFilter::parse(
        params.region.as_deref(),
        params.currency.as_deref(),
        params.sort.as_deref(),
    )?;

    let records = state.store.call(move |store| store.list(&filter)).await?;
    Ok(Json(records))
}

/// GET /countries/:name
pub async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<CountryRecord>> {
    let record = state
        .store
        .call(move |store| store.get(&name))
        .await?
        .ok_or(Error::NotFound("Country not found"))?;

    Ok(Json(record))
}

/// DELETE /countries/:name
pub async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state.store.call(move |store| store.delete(&name)).await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Country not found").into())
    }
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let status = state.store.call(|store| store.status()).await?;

    Ok(Json(StatusResponse {
        total_countries: status.total_countries,
        last_refreshed_at: status.last_refreshed_at,
    }))
}

/// GET /countries/image
pub async fn summary_image(State(state): State<AppState>) -> ApiResult<Response> {
    let bytes = match tokio::fs::read(state.refresher.image_path()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound("Summary image not found").into());
        }
        Err(e) => return Err(Error::Io(e).into()),
    };

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
