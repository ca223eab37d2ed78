use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use snaploc_engine::RetailerMatch;

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ClosestParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub zip_code: Option<String>,
    pub k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RetailerItem {
    pub record_id: String,
    pub store_name: String,
    pub store_type: String,
    pub street_number: String,
    pub street_name: String,
    pub additional_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub zip4: String,
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    pub authorization_date: String,
    pub end_date: String,
    pub distance_miles: f64,
}

impl From<RetailerMatch<'_>> for RetailerItem {
    fn from(hit: RetailerMatch<'_>) -> Self {
        let r = hit.retailer;
        Self {
            record_id: r.record_id.clone(),
            store_name: r.store_name.clone(),
            store_type: r.store_type.clone(),
            street_number: r.street_number.clone(),
            street_name: r.street_name.clone(),
            additional_address: r.additional_address.clone(),
            city: r.city.clone(),
            state: r.state.clone(),
            zip_code: r.zip_code.clone(),
            zip4: r.zip4.clone(),
            county: r.county.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
            authorization_date: r.authorization_date.clone(),
            end_date: r.end_date.clone(),
            distance_miles: hit.distance_miles,
        }
    }
}

/// Resolves the requested result count, rejecting values outside `1..=max_k`.
pub(super) fn normalize_k(k: Option<i64>, default_k: usize, max_k: usize) -> Result<usize, String> {
    let Some(k) = k else {
        return Ok(default_k);
    };
    usize::try_from(k)
        .ok()
        .filter(|k| (1..=max_k).contains(k))
        .ok_or_else(|| format!("k must be between 1 and {max_k}"))
}

pub(super) async fn closest_retailers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<ClosestParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<RetailerItem>>>, ApiError> {
    let Query(params) =
        params.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;

    let k = normalize_k(params.k, state.default_k, state.max_k)
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    if params.lat.is_some_and(|v| !v.is_finite()) || params.lon.is_some_and(|v| !v.is_finite()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "lat and lon must be finite numbers",
        ));
    }

    let zip_code = params
        .zip_code
        .as_deref()
        .map(str::trim)
        .filter(|z| !z.is_empty());

    let dataset = state
        .engine
        .dataset()
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let matches = match (params.lat, params.lon, zip_code) {
        (Some(lat), Some(lon), _) => dataset.closest_by_coords(lat, lon, k),
        (_, _, Some(zip_code)) => dataset.closest_by_zip(zip_code, k),
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "bad_request",
                "provide either (lat and lon) or zip_code",
            ))
        }
    };

    tracing::debug!(k, returned = matches.len(), "closest retailers query");

    let data = matches.into_iter().map(RetailerItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
