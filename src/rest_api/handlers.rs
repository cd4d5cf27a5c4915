//! HTTP handlers for the governor endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{error, instrument};

use crate::error::Error;
use crate::governor::{
    AvailableNotionalByChain, ChainFilter, ChainId, EnqueuedVaas, GovernorLimit,
    NotionalAvailableDetail, NotionalLimitDetail,
};
use crate::service::GovernorService;

use super::dto::{ChainQuery, DataResponse, EnqueuedStatusResponse, ErrorResponse, HealthResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

fn fetch_failed(e: Error) -> ApiError {
    error!("Failed to fetch governor reports: {}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new(e.kind(), &e.to_string())),
    )
}

fn not_found(message: String) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("not_found", &message)),
    )
}

/// Health check endpoint
#[instrument]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Quorum-derived governor limit for every chain
#[instrument(skip(service))]
pub async fn governor_limits(
    State(service): State<Arc<GovernorService>>,
) -> ApiResult<Vec<GovernorLimit>> {
    service
        .governor_limits(ChainFilter::All)
        .await
        .map(|limits| Json(DataResponse::new(limits)))
        .map_err(fetch_failed)
}

/// Quorum-derived governor limit for one chain
#[instrument(skip(service))]
pub async fn notional_limit_by_chain(
    State(service): State<Arc<GovernorService>>,
    Path(chain): Path<ChainId>,
) -> ApiResult<GovernorLimit> {
    match service.notional_limit(chain).await.map_err(fetch_failed)? {
        Some(limit) => Ok(Json(DataResponse::new(limit))),
        None => Err(not_found(format!("No governor limit for chain {}", chain))),
    }
}

/// Per-guardian configured limits
#[instrument(skip(service))]
pub async fn notional_limit_details(
    State(service): State<Arc<GovernorService>>,
    Query(query): Query<ChainQuery>,
) -> ApiResult<Vec<NotionalLimitDetail>> {
    service
        .notional_limit_details(query.chain.into())
        .await
        .map(|details| Json(DataResponse::new(details)))
        .map_err(fetch_failed)
}

/// Per-guardian available notional
#[instrument(skip(service))]
pub async fn notional_available(
    State(service): State<Arc<GovernorService>>,
    Query(query): Query<ChainQuery>,
) -> ApiResult<Vec<NotionalAvailableDetail>> {
    service
        .notional_available_details(query.chain.into())
        .await
        .map(|details| Json(DataResponse::new(details)))
        .map_err(fetch_failed)
}

/// Highest available notional reported for one chain
#[instrument(skip(service))]
pub async fn max_available_notional(
    State(service): State<Arc<GovernorService>>,
    Path(chain): Path<ChainId>,
) -> ApiResult<NotionalAvailableDetail> {
    match service
        .max_available_notional(chain)
        .await
        .map_err(fetch_failed)?
    {
        Some(detail) => Ok(Json(DataResponse::new(detail))),
        None => Err(not_found(format!(
            "No available notional reported for chain {}",
            chain
        ))),
    }
}

/// Worst-case single guardian report per chain
#[instrument(skip(service))]
pub async fn available_notional_by_chain(
    State(service): State<Arc<GovernorService>>,
) -> ApiResult<Vec<AvailableNotionalByChain>> {
    service
        .available_notional_by_chain()
        .await
        .map(|result| Json(DataResponse::new(result)))
        .map_err(fetch_failed)
}

/// Deduplicated enqueued VAAs grouped by chain
#[instrument(skip(service))]
pub async fn enqueued_vaas(
    State(service): State<Arc<GovernorService>>,
    Query(query): Query<ChainQuery>,
) -> ApiResult<Vec<EnqueuedVaas>> {
    service
        .enqueued_vaas(query.chain.into())
        .await
        .map(|enqueued| Json(DataResponse::new(enqueued)))
        .map_err(fetch_failed)
}

/// Whether a message is currently held by the governor
#[instrument(skip(service))]
pub async fn is_vaa_enqueued(
    State(service): State<Arc<GovernorService>>,
    Path((chain, emitter, sequence)): Path<(ChainId, String, u64)>,
) -> ApiResult<EnqueuedStatusResponse> {
    service
        .is_vaa_enqueued(chain, &emitter, sequence)
        .await
        .map(|is_enqueued| Json(DataResponse::new(EnqueuedStatusResponse { is_enqueued })))
        .map_err(fetch_failed)
}
