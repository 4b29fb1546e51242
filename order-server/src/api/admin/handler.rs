//! Admin API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::orders::handler::OrderListQuery;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use shared::models::order::{Order, OrderStatistics, OrderStatusUpdate};
use shared::{ApiResponse, AppResult, PaginatedResponse};

/// Extra filter on the global listing: scope to one customer
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub base: OrderListQuery,
}

/// List all orders across users
pub async fn list_all(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let mut filter = query.base.filter();
    filter.user_id = query.user_id;
    let page = state
        .order_service()
        .list_all(&user, filter, &query.base.pagination)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Drive a status transition
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .order_service()
        .transition_status(&user, &id, payload.status, payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// On-demand statistics over a date range
pub async fn statistics(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<ApiResponse<OrderStatistics>>> {
    let mut filter = query.base.filter();
    filter.user_id = query.user_id;
    let stats = state.order_service().statistics(&user, filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}
