//! Favorite listings endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, models::listing::Listing};

use super::AuthenticatedUser;

/// Caller's favorite listings
#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Favorite listings, most recently saved first", body = Vec<Listing>)
    )
)]
pub async fn list_favorites(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Listing>>> {
    let listings = state.services.favorites.list(claims.user_id).await?;
    Ok(Json(listings))
}

/// Save a listing
#[utoipa::path(
    post,
    path = "/favorites/{listing_id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(("listing_id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing saved"),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_favorite(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.favorites.add(claims.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a saved listing
#[utoipa::path(
    delete,
    path = "/favorites/{listing_id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(("listing_id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing removed"),
        (status = 404, description = "Not a favorite", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_favorite(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.favorites.remove(claims.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
