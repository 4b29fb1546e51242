//! Order API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order::OrderFilter;
use shared::models::order::{
    Order, OrderCancel, OrderCreate, OrderStatus, OrderUpdate, StatusHistoryEntry,
};
use shared::{ApiResponse, AppResult, PaginatedResponse, PaginationQuery};

/// Query params for order listings
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

impl OrderListQuery {
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            user_id: None,
            status: self.status,
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

/// Create a new order
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<impl IntoResponse> {
    let order = state.order_service().create_order(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// List the caller's own orders
pub async fn list_mine(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let page = state
        .order_service()
        .list_mine(&user, query.filter(), &query.pagination)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// Get one order
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service().get_order(&user, &id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Edit a pending order (owner only)
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .order_service()
        .update_order(&user, &id, payload)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Cancel an order
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Option<Json<OrderCancel>>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let order = state
        .order_service()
        .cancel_order(&user, &id, reason)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Get the status history of an order
pub async fn history(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<StatusHistoryEntry>>>> {
    let entries = state.order_service().history(&user, &id).await?;
    Ok(Json(ApiResponse::success(entries)))
}
