//! API handlers for the marketplace REST endpoints

pub mod favorites;
pub mod health;
pub mod inquiries;
pub mod listings;
pub mod notifications;
pub mod openapi;
pub mod payment_methods;
pub mod visits;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Authenticated user whose stored role is admin
pub struct AdminUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        state.services.users.require_admin(claims.user_id).await?;
        Ok(AdminUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Listings
        .route("/listings", get(listings::list_listings))
        .route("/listings/:id", get(listings::get_listing))
        .route("/listings/:id/featured", put(listings::set_featured))
        .route("/listings/:id/inquiries", post(inquiries::create_inquiry))
        // Inquiries
        .route("/inquiries/received", get(inquiries::list_received))
        // Favorites
        .route("/favorites", get(favorites::list_favorites))
        .route("/favorites/:listing_id", post(favorites::add_favorite))
        .route("/favorites/:listing_id", delete(favorites::remove_favorite))
        // Visit requests
        .route("/visits", post(visits::create_visit))
        .route("/visits/mine", get(visits::list_my_visits))
        .route("/visits/management", get(visits::list_incoming_visits))
        .route("/visits/admin", get(visits::list_all_visits))
        .route("/visits/admin/summary", get(visits::visits_summary))
        .route("/visits/release", post(visits::release_payout))
        .route("/visits/:id", get(visits::get_visit))
        .route("/visits/:id/confirm-payment", post(visits::confirm_payment))
        .route("/visits/:id/cancel", post(visits::cancel_visit))
        .route("/visits/:id/refund", post(visits::refund_visit))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications", post(notifications::create_notification))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/preferences", get(notifications::get_preferences))
        .route("/notifications/preferences", put(notifications::update_preferences))
        .route("/notifications/:id", delete(notifications::delete_notification))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Payment methods
        .route("/payment-methods", get(payment_methods::list_payment_methods))
        .route("/payment-methods/all", get(payment_methods::list_all_payment_methods))
        .route("/payment-methods/:code", put(payment_methods::upsert_payment_method))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
