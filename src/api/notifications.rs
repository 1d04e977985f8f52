//! Notification inbox endpoints

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
    models::notification::{
        NewNotification, Notification, NotificationPreferences, NotificationQuery, UpdatePreferences,
    },
};

use super::{AdminUser, AuthenticatedUser};

/// Paginated notifications response
#[derive(Serialize, ToSchema)]
pub struct NotificationsListResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread: i64,
}

#[derive(Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// Caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = NotificationsListResponse)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<NotificationsListResponse>> {
    let (notifications, total) = state.services.notifications.list(claims.user_id, &query).await?;
    let unread = state.services.notifications.unread_count(claims.user_id).await?;
    Ok(Json(NotificationsListResponse {
        notifications,
        total,
        unread,
    }))
}

/// Send a notification to a user (admin)
#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = NewNotification,
    responses(
        (status = 201, description = "Notification created and dispatched", body = Notification)
    )
)]
pub async fn create_notification(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Json(data): Json<NewNotification>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let notification = state.services.notifications.create(data).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse)
    )
)]
pub async fn unread_count(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = state.services.notifications.unread_count(claims.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.notifications.mark_read(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark every notification as read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of notifications marked", body = MarkAllReadResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let updated = state.services.notifications.mark_all_read(claims.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_notification(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.notifications.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Caller's channel preferences
#[utoipa::path(
    get,
    path = "/notifications/preferences",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Channel preferences", body = NotificationPreferences)
    )
)]
pub async fn get_preferences(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<NotificationPreferences>> {
    let preferences = state.services.notifications.preferences(claims.user_id).await?;
    Ok(Json(preferences))
}

/// Enable or disable channels
#[utoipa::path(
    put,
    path = "/notifications/preferences",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = UpdatePreferences,
    responses(
        (status = 200, description = "Updated preferences", body = NotificationPreferences)
    )
)]
pub async fn update_preferences(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<UpdatePreferences>,
) -> AppResult<Json<NotificationPreferences>> {
    let preferences = state
        .services
        .notifications
        .update_preferences(claims.user_id, &data)
        .await?;
    Ok(Json(preferences))
}
