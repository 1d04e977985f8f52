//! Payment method configuration shown to buyers paying a visit fee

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    /// Stable identifier, e.g. "mobile_money"
    pub code: String,
    pub display_name: String,
    /// Instructions displayed next to the payment reference
    pub instructions: Option<String>,
    /// Account / wallet number buyers pay into
    pub account_details: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /payment-methods/{code}`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertPaymentMethod {
    pub display_name: String,
    pub instructions: Option<String>,
    pub account_details: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}
