//! Inquiry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::inquiry::{CreateInquiry, Inquiry, InquiryQuery},
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct InquiriesListResponse {
    pub inquiries: Vec<Inquiry>,
    pub total: i64,
}

/// Send an inquiry to the seller of a listing
#[utoipa::path(
    post,
    path = "/listings/{id}/inquiries",
    tag = "inquiries",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = CreateInquiry,
    responses(
        (status = 201, description = "Inquiry sent", body = Inquiry),
        (status = 400, description = "Empty message", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_inquiry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
    Json(data): Json<CreateInquiry>,
) -> AppResult<(StatusCode, Json<Inquiry>)> {
    let inquiry = state
        .services
        .inquiries
        .create(claims.user_id, listing_id, &data)
        .await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}

/// Inquiries received on the caller's listings
#[utoipa::path(
    get,
    path = "/inquiries/received",
    tag = "inquiries",
    security(("bearer_auth" = [])),
    params(InquiryQuery),
    responses(
        (status = 200, description = "Received inquiries, newest first", body = InquiriesListResponse)
    )
)]
pub async fn list_received(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<InquiryQuery>,
) -> AppResult<Json<InquiriesListResponse>> {
    let (inquiries, total) = state
        .services
        .inquiries
        .received(claims.user_id, query.page, query.per_page)
        .await?;
    Ok(Json(InquiriesListResponse { inquiries, total }))
}
