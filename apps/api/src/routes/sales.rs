//! Sale handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;

use tally_core::{CreateSaleRequest, SaleDetail, SaleFilter, SaleListing};

use crate::error::ApiResult;
use crate::extract::{Actor, Body, Params};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id))
        .route("/{id}/complete", post(complete))
        .route("/{id}/cancel", post(cancel))
}

/// GET /sales?locationId=&cashierId=&startDate=&endDate=&limit=
async fn list(
    State(state): State<AppState>,
    Params(filter): Params<SaleFilter>,
) -> ApiResult<Json<SaleListing>> {
    let listing = state.db.sales().list(&filter).await?;
    Ok(Json(listing))
}

/// GET /sales/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    let sale = state.db.sales().get(&id).await?;
    Ok(Json(sale))
}

/// POST /sales - the caller is the cashier.
async fn create(
    State(state): State<AppState>,
    Actor(cashier_id): Actor,
    Body(request): Body<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    debug!(
        cashier_id = %cashier_id,
        location_id = %request.location_id,
        lines = request.items.len(),
        "create_sale"
    );
    let sale = state.db.sales().create(&request, &cashier_id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// POST /sales/{id}/complete
async fn complete(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    let sale = state.db.sales().complete_sale(&id, &user_id).await?;
    Ok(Json(sale))
}

/// POST /sales/{id}/cancel
async fn cancel(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    debug!(user_id = %user_id, sale_id = %id, "cancel_sale");
    let sale = state.db.sales().cancel(&id).await?;
    Ok(Json(sale))
}
