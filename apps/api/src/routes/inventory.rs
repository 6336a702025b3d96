//! Inventory handlers: stock levels, ledger mutations and the movement log.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tally_core::{
    AdjustRequest, Movement, MovementFilter, ReceiptRequest, StockLevel, TransferRequest,
    WriteOffRequest,
};

use crate::error::ApiResult;
use crate::extract::{Actor, Body, Params};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(by_location))
        .route("/product/{product_id}", get(by_product))
        .route("/receipt", post(receipt))
        .route("/transfer", post(transfer))
        .route("/writeoff", post(write_off))
        .route("/adjust", post(adjust))
        .route("/movements", get(movements))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub location_id: String,
}

/// Outcome of a stock take. `movement` is absent when the count matched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustResponse {
    pub adjusted: bool,
    pub movement: Option<Movement>,
}

// =============================================================================
// Queries
// =============================================================================

/// GET /inventory?locationId=
async fn by_location(
    State(state): State<AppState>,
    Params(query): Params<LocationQuery>,
) -> ApiResult<Json<Vec<StockLevel>>> {
    let levels = state.db.stock().get_by_location(&query.location_id).await?;
    Ok(Json(levels))
}

/// GET /inventory/product/{product_id}
async fn by_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Vec<StockLevel>>> {
    let levels = state.db.stock().get_by_product(&product_id).await?;
    Ok(Json(levels))
}

/// GET /inventory/movements?productId=&locationId=&saleId=&type=&limit=
async fn movements(
    State(state): State<AppState>,
    Params(filter): Params<MovementFilter>,
) -> ApiResult<Json<Vec<Movement>>> {
    let movements = state.db.movements().list(&filter).await?;
    Ok(Json(movements))
}

// =============================================================================
// Mutations
// =============================================================================

/// POST /inventory/receipt
async fn receipt(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Body(request): Body<ReceiptRequest>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    debug!(user_id = %user_id, product_id = %request.product_id, "receipt");
    let movement = state.db.stock().receipt(&request, &user_id).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST /inventory/transfer
async fn transfer(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Body(request): Body<TransferRequest>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    debug!(user_id = %user_id, product_id = %request.product_id, "transfer");
    let movement = state.db.stock().transfer(&request, &user_id).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST /inventory/writeoff
async fn write_off(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Body(request): Body<WriteOffRequest>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    debug!(user_id = %user_id, product_id = %request.product_id, "write_off");
    let movement = state.db.stock().write_off(&request, &user_id).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST /inventory/adjust
async fn adjust(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Body(request): Body<AdjustRequest>,
) -> ApiResult<Json<AdjustResponse>> {
    debug!(user_id = %user_id, product_id = %request.product_id, "adjust");
    let movement = state.db.stock().adjust(&request, &user_id).await?;
    Ok(Json(AdjustResponse {
        adjusted: movement.is_some(),
        movement,
    }))
}
