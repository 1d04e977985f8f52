//! Visit request endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::visit::{
        ConfirmPayment, CreateVisitRequest, RefundVisit, ReleasePayout, VisitQuery, VisitRequest,
        VisitRequestDetails, VisitSummary,
    },
};

use super::{AdminUser, AuthenticatedUser};

const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// Paginated visit requests response
#[derive(Serialize, ToSchema)]
pub struct VisitsListResponse {
    pub visit_requests: Vec<VisitRequest>,
    pub total: i64,
}

/// Paginated visit requests with listing details
#[derive(Serialize, ToSchema)]
pub struct VisitDetailsListResponse {
    pub visit_requests: Vec<VisitRequestDetails>,
    pub total: i64,
}

/// Book a visit and get a payment reference
#[utoipa::path(
    post,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("Idempotency-Key" = Option<String>, Header, description = "Replays return the original request")),
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit request created", body = VisitRequest),
        (status = 200, description = "Existing request for this Idempotency-Key", body = VisitRequest),
        (status = 400, description = "Missing or invalid fields, or a malformed Idempotency-Key", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing token or unknown user", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found or not available", body = crate::error::ErrorResponse),
        (status = 409, description = "Listing does not accept visit requests", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    headers: HeaderMap,
    Json(data): Json<CreateVisitRequest>,
) -> AppResult<(StatusCode, Json<VisitRequest>)> {
    let key = headers
        .get(IDEMPOTENCY_KEY)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| AppError::BadRequest("Idempotency-Key must be visible ASCII".to_string()))?;
    let result = state.services.visits.create(claims.user_id, &data, key).await?;
    let status = if result.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(result.request)))
}

/// Visit requests made by the caller
#[utoipa::path(
    get,
    path = "/visits/mine",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Caller's visit requests", body = VisitsListResponse)
    )
)]
pub async fn list_my_visits(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitsListResponse>> {
    let (visit_requests, total) = state.services.visits.list_for_buyer(claims.user_id, &query).await?;
    Ok(Json(VisitsListResponse { visit_requests, total }))
}

/// Visit requests on the caller's listings
#[utoipa::path(
    get,
    path = "/visits/management",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Incoming visit requests", body = VisitsListResponse)
    )
)]
pub async fn list_incoming_visits(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitsListResponse>> {
    let (visit_requests, total) = state.services.visits.list_for_seller(claims.user_id, &query).await?;
    Ok(Json(VisitsListResponse { visit_requests, total }))
}

/// All visit requests (admin)
#[utoipa::path(
    get,
    path = "/visits/admin",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Visit requests with listing details", body = VisitDetailsListResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_visits(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitDetailsListResponse>> {
    let (visit_requests, total) = state.services.visits.list_all(&query).await?;
    Ok(Json(VisitDetailsListResponse { visit_requests, total }))
}

/// Fee ledger summary (admin)
#[utoipa::path(
    get,
    path = "/visits/admin/summary",
    tag = "visits",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counts and totals per status", body = VisitSummary)
    )
)]
pub async fn visits_summary(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<VisitSummary>> {
    let summary = state.services.visits.summary().await?;
    Ok(Json(summary))
}

/// Get a visit request (buyer, seller or admin)
#[utoipa::path(
    get,
    path = "/visits/{id}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit request ID")),
    responses(
        (status = 200, description = "Visit request", body = VisitRequest),
        (status = 403, description = "Not a party to this request", body = crate::error::ErrorResponse),
        (status = 404, description = "Visit request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VisitRequest>> {
    let request = state.services.visits.get(id, claims.user_id).await?;
    Ok(Json(request))
}

/// Confirm the buyer's payment (admin)
#[utoipa::path(
    post,
    path = "/visits/{id}/confirm-payment",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit request ID")),
    request_body = ConfirmPayment,
    responses(
        (status = 200, description = "Payment confirmed", body = VisitRequest),
        (status = 409, description = "Request is not awaiting payment", body = crate::error::ErrorResponse)
    )
)]
pub async fn confirm_payment(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    data: Option<Json<ConfirmPayment>>,
) -> AppResult<Json<VisitRequest>> {
    let data = data.map(|Json(d)| d).unwrap_or_default();
    let request = state.services.visits.confirm_payment(id, admin.user_id, &data).await?;
    Ok(Json(request))
}

/// Release the seller payout (admin)
#[utoipa::path(
    post,
    path = "/visits/release",
    tag = "visits",
    security(("bearer_auth" = [])),
    request_body = ReleasePayout,
    responses(
        (status = 200, description = "Payout released", body = VisitRequest),
        (status = 404, description = "Visit request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Payment not confirmed or payout already released", body = crate::error::ErrorResponse)
    )
)]
pub async fn release_payout(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Json(data): Json<ReleasePayout>,
) -> AppResult<Json<VisitRequest>> {
    let request = state
        .services
        .visits
        .release(data.visit_request_id, admin.user_id)
        .await?;
    Ok(Json(request))
}

/// Cancel an unpaid visit request (buyer or admin)
#[utoipa::path(
    post,
    path = "/visits/{id}/cancel",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit request ID")),
    responses(
        (status = 200, description = "Visit request cancelled", body = VisitRequest),
        (status = 409, description = "Request is not awaiting payment", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_visit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VisitRequest>> {
    let request = state.services.visits.cancel(id, claims.user_id).await?;
    Ok(Json(request))
}

/// Refund a confirmed payment (admin)
#[utoipa::path(
    post,
    path = "/visits/{id}/refund",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit request ID")),
    request_body = RefundVisit,
    responses(
        (status = 200, description = "Visit fee refunded", body = VisitRequest),
        (status = 409, description = "Payment not confirmed or payout already released", body = crate::error::ErrorResponse)
    )
)]
pub async fn refund_visit(
    State(state): State<crate::AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    data: Option<Json<RefundVisit>>,
) -> AppResult<Json<VisitRequest>> {
    let data = data.map(|Json(d)| d).unwrap_or_default();
    let request = state
        .services
        .visits
        .refund(id, admin.user_id, data.reason.as_deref())
        .await?;
    Ok(Json(request))
}
