//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{favorites, health, inquiries, listings, notifications, payment_methods, visits};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Classifieds API",
        version = "1.0.0",
        description = "Classifieds marketplace REST API: listings, paid visit requests and notifications"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Listings
        listings::list_listings,
        listings::get_listing,
        listings::set_featured,
        // Inquiries
        inquiries::create_inquiry,
        inquiries::list_received,
        // Favorites
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        // Visits
        visits::create_visit,
        visits::list_my_visits,
        visits::list_incoming_visits,
        visits::list_all_visits,
        visits::visits_summary,
        visits::get_visit,
        visits::confirm_payment,
        visits::release_payout,
        visits::cancel_visit,
        visits::refund_visit,
        // Notifications
        notifications::list_notifications,
        notifications::create_notification,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        notifications::get_preferences,
        notifications::update_preferences,
        // Payment methods
        payment_methods::list_payment_methods,
        payment_methods::list_all_payment_methods,
        payment_methods::upsert_payment_method,
    ),
    components(
        schemas(
            // Listings
            crate::models::listing::Listing,
            crate::models::listing::ListingCategory,
            crate::models::listing::ListingStatus,
            crate::models::listing::RoadAccess,
            crate::models::listing::ListingQuery,
            crate::models::listing::SetFeatured,
            listings::ListingsListResponse,
            // Inquiries
            crate::models::inquiry::Inquiry,
            crate::models::inquiry::CreateInquiry,
            inquiries::InquiriesListResponse,
            // Visits
            crate::models::visit::VisitStatus,
            crate::models::visit::VisitRequest,
            crate::models::visit::VisitRequestDetails,
            crate::models::visit::CreateVisitRequest,
            crate::models::visit::ConfirmPayment,
            crate::models::visit::ReleasePayout,
            crate::models::visit::RefundVisit,
            crate::models::visit::VisitStatusTotals,
            crate::models::visit::VisitSummary,
            visits::VisitsListResponse,
            visits::VisitDetailsListResponse,
            // Notifications
            crate::models::notification::Channel,
            crate::models::notification::Priority,
            crate::models::notification::NotificationStatus,
            crate::models::notification::ChannelOutcome,
            crate::models::notification::ChannelDelivery,
            crate::models::notification::Notification,
            crate::models::notification::NewNotification,
            crate::models::notification::NotificationPreferences,
            crate::models::notification::UpdatePreferences,
            notifications::NotificationsListResponse,
            notifications::UnreadCountResponse,
            notifications::MarkAllReadResponse,
            // Payment methods
            crate::models::payment_method::PaymentMethod,
            crate::models::payment_method::UpsertPaymentMethod,
            // Users
            crate::models::user::UserRole,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "listings", description = "Listing search and promotion"),
        (name = "inquiries", description = "Buyer messages to sellers"),
        (name = "favorites", description = "Saved listings"),
        (name = "visits", description = "Paid visit requests and seller payouts"),
        (name = "notifications", description = "Notification inbox and channel preferences"),
        (name = "payment_methods", description = "Accepted payment methods")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
