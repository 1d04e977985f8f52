//! Visit request model and lifecycle

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::listing::ListingCategory;
use crate::error::{AppError, AppResult};

/// Single lifecycle of a visit request.
///
/// ```text
/// awaiting_payment -> payment_confirmed -> payout_released
///        |                    |
///        v                    v
///    cancelled             refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    AwaitingPayment,
    PaymentConfirmed,
    PayoutReleased,
    Cancelled,
    Refunded,
}

text_enum!(VisitStatus {
    AwaitingPayment => "awaiting_payment",
    PaymentConfirmed => "payment_confirmed",
    PayoutReleased => "payout_released",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl VisitStatus {
    pub const ALL: [VisitStatus; 5] = [
        VisitStatus::AwaitingPayment,
        VisitStatus::PaymentConfirmed,
        VisitStatus::PayoutReleased,
        VisitStatus::Cancelled,
        VisitStatus::Refunded,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VisitStatus::PayoutReleased | VisitStatus::Cancelled | VisitStatus::Refunded
        )
    }

    pub fn can_transition_to(self, next: VisitStatus) -> bool {
        matches!(
            (self, next),
            (VisitStatus::AwaitingPayment, VisitStatus::PaymentConfirmed)
                | (VisitStatus::AwaitingPayment, VisitStatus::Cancelled)
                | (VisitStatus::PaymentConfirmed, VisitStatus::PayoutReleased)
                | (VisitStatus::PaymentConfirmed, VisitStatus::Refunded)
        )
    }
}

/// Visit request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitRequest {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub notes: Option<String>,
    /// Payment channel the buyer intends to use (payment method code)
    pub payment_method: Option<String>,
    /// Total fee in minor units, copied from the listing at creation
    pub visit_fee_amount: i64,
    pub platform_fee: i64,
    pub seller_payout: i64,
    pub currency: String,
    pub status: VisitStatus,
    /// Reference the buyer quotes when paying through an external channel
    pub payment_reference: String,
    pub payment_transaction_id: Option<String>,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub confirmed_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub released_by: Option<Uuid>,
    pub released_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_by: Option<Uuid>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visit request joined with listing data for admin screens
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitRequestDetails {
    #[serde(flatten)]
    pub request: VisitRequest,
    pub listing_title: Option<String>,
    pub listing_category: Option<ListingCategory>,
}

/// Body of `POST /visits`. The fee is never read from the request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateVisitRequest {
    pub listing_id: Uuid,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    /// Visit date (YYYY-MM-DD)
    pub visit_date: Option<String>,
    /// Visit time (HH:MM)
    pub visit_time: Option<String>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

/// Trimmed and parsed buyer contact and schedule
#[derive(Debug, Clone, Validate)]
pub struct VisitContact {
    #[validate(length(max = 200, message = "Name is too long"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 32, message = "Invalid phone number"))]
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreateVisitRequest {
    /// Check required fields and parse the schedule
    pub fn contact(&self) -> AppResult<VisitContact> {
        let name = present(&self.buyer_name);
        let email = present(&self.buyer_email);
        let phone = present(&self.buyer_phone);
        let date = present(&self.visit_date);
        let time = present(&self.visit_time);

        let missing: Vec<&str> = [
            ("buyer_name", name.is_none()),
            ("buyer_email", email.is_none()),
            ("buyer_phone", phone.is_none()),
            ("visit_date", date.is_none()),
            ("visit_time", time.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(field, _)| field)
        .collect();

        let (Some(name), Some(email), Some(phone), Some(date), Some(time)) = (name, email, phone, date, time)
        else {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Invalid visit_date, expected YYYY-MM-DD".to_string()))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| AppError::Validation("Invalid visit_time, expected HH:MM".to_string()))?;

        let contact = VisitContact {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            date,
            time,
            notes: present(&self.notes).map(str::to_string),
        };
        contact
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(contact)
    }
}

/// Row to insert, fully computed by the visit service
#[derive(Debug, Clone)]
pub struct NewVisitRequest {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub contact: VisitContact,
    pub payment_method: Option<String>,
    pub visit_fee_amount: i64,
    pub platform_fee: i64,
    pub seller_payout: i64,
    pub currency: String,
    pub payment_reference: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewVisitRequest {
    /// Row as it looks right after insertion
    pub fn into_request(self) -> VisitRequest {
        VisitRequest {
            id: self.id,
            listing_id: self.listing_id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            buyer_name: self.contact.name,
            buyer_email: self.contact.email,
            buyer_phone: self.contact.phone,
            visit_date: self.contact.date,
            visit_time: self.contact.time,
            notes: self.contact.notes,
            payment_method: self.payment_method,
            visit_fee_amount: self.visit_fee_amount,
            platform_fee: self.platform_fee,
            seller_payout: self.seller_payout,
            currency: self.currency,
            status: VisitStatus::AwaitingPayment,
            payment_reference: self.payment_reference,
            payment_transaction_id: None,
            idempotency_key: self.idempotency_key,
            confirmed_by: None,
            confirmed_at: None,
            released_by: None,
            released_at: None,
            cancelled_by: None,
            cancelled_at: None,
            refunded_by: None,
            refunded_at: None,
            refund_reason: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Conditional status change: applied only while the row is in `from`
#[derive(Debug, Clone)]
pub struct VisitTransition {
    pub from: VisitStatus,
    pub to: VisitStatus,
    pub actor: Uuid,
    pub at: DateTime<Utc>,
    pub payment_transaction_id: Option<String>,
    pub reason: Option<String>,
}

/// Store level filter
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
    pub status: Option<VisitStatus>,
    pub listing_id: Option<Uuid>,
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
}

/// Query parameters for visit request lists
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct VisitQuery {
    pub status: Option<VisitStatus>,
    pub listing_id: Option<Uuid>,
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}

/// Admin confirmation that the buyer paid out of band
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfirmPayment {
    pub payment_transaction_id: Option<String>,
    /// When given, must equal the reference issued at creation
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReleasePayout {
    pub visit_request_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RefundVisit {
    pub reason: Option<String>,
}

/// Per status aggregate used by the admin summary
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct VisitStatusTotals {
    pub status: VisitStatus,
    pub count: i64,
    pub fee_total: i64,
    pub platform_fee_total: i64,
    pub seller_payout_total: i64,
}

/// Admin overview of the visit fee ledger
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitSummary {
    pub platform_fee_bps: u32,
    pub statuses: Vec<VisitStatusTotals>,
    /// Fees paid and not refunded
    pub fees_collected: i64,
    /// Platform share of the fees collected
    pub platform_revenue: i64,
    pub seller_payouts_released: i64,
    /// Confirmed payments whose payout is still owed
    pub seller_payouts_pending: i64,
}

impl VisitSummary {
    pub fn from_totals(platform_fee_bps: u32, statuses: Vec<VisitStatusTotals>) -> Self {
        let sum = |wanted: &[VisitStatus], field: fn(&VisitStatusTotals) -> i64| -> i64 {
            statuses
                .iter()
                .filter(|t| wanted.contains(&t.status))
                .map(field)
                .sum()
        };
        let paid = [VisitStatus::PaymentConfirmed, VisitStatus::PayoutReleased];

        Self {
            platform_fee_bps,
            fees_collected: sum(&paid, |t| t.fee_total),
            platform_revenue: sum(&paid, |t| t.platform_fee_total),
            seller_payouts_released: sum(&[VisitStatus::PayoutReleased], |t| t.seller_payout_total),
            seller_payouts_pending: sum(&[VisitStatus::PaymentConfirmed], |t| t.seller_payout_total),
            statuses,
        }
    }
}
