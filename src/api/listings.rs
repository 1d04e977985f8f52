//! Listing browse endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::listing::{Listing, ListingQuery, SetFeatured},
};

use super::AdminUser;

/// Paginated listings response
#[derive(Serialize, ToSchema)]
pub struct ListingsListResponse {
    pub listings: Vec<Listing>,
    pub total: i64,
}

/// Browse listings with filters and pagination
#[utoipa::path(
    get,
    path = "/listings",
    tag = "listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "Listings, featured first then newest", body = ListingsListResponse)
    )
)]
pub async fn list_listings(
    State(state): State<crate::AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<ListingsListResponse>> {
    let (listings, total) = state.services.listings.search(&query).await?;
    Ok(Json(ListingsListResponse { listings, total }))
}

/// Get listing by ID
#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing details", body = Listing),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_listing(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Listing>> {
    let listing = state.services.listings.get(id).await?;
    Ok(Json(listing))
}

/// Feature or unfeature a listing (admin)
#[utoipa::path(
    put,
    path = "/listings/{id}/featured",
    tag = "listings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = SetFeatured,
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_featured(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(data): Json<SetFeatured>,
) -> AppResult<Json<Listing>> {
    let listing = state.services.listings.set_featured(id, data.featured).await?;
    Ok(Json(listing))
}
