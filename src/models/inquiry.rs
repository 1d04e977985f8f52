//! Buyer inquiries sent to a listing's seller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Inquiry {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub sender_id: Uuid,
    pub seller_id: Uuid,
    pub message: String,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /listings/{id}/inquiries`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateInquiry {
    pub message: Option<String>,
    pub contact_phone: Option<String>,
}

/// Seller inbox paging
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InquiryQuery {
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}
