//! Notification templates for marketplace events

use serde_json::json;
use uuid::Uuid;

use crate::models::{
    inquiry::Inquiry,
    listing::Listing,
    notification::{Channel, NewNotification, Priority},
    visit::VisitRequest,
};

/// Event a user is notified about
#[derive(Debug, Clone, Copy)]
pub enum NotificationEvent<'a> {
    /// To the seller, when a buyer books a visit
    VisitRequested(&'a VisitRequest),
    /// To buyer and seller, when an admin confirms the fee was paid
    VisitPaymentConfirmed(&'a VisitRequest),
    /// To the seller
    PayoutReleased(&'a VisitRequest),
    VisitCancelled(&'a VisitRequest),
    /// To the buyer
    VisitRefunded(&'a VisitRequest),
    /// To the seller
    InquiryReceived { inquiry: &'a Inquiry, listing: &'a Listing },
    /// To the seller, when the listing becomes featured
    PromotionActivated(&'a Listing),
}

/// Minor units rendered with two decimals ("10500" -> "105.00 GHS")
pub fn format_amount(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

impl NotificationEvent<'_> {
    pub fn notification_type(&self) -> &'static str {
        match self {
            NotificationEvent::VisitRequested(_) => "visit_requested",
            NotificationEvent::VisitPaymentConfirmed(_) => "visit_payment_confirmed",
            NotificationEvent::PayoutReleased(_) => "payout_released",
            NotificationEvent::VisitCancelled(_) => "visit_cancelled",
            NotificationEvent::VisitRefunded(_) => "visit_refunded",
            NotificationEvent::InquiryReceived { .. } => "inquiry_received",
            NotificationEvent::PromotionActivated(_) => "promotion_activated",
        }
    }

    /// Build the notification addressed to `user_id`
    pub fn render(&self, user_id: Uuid) -> NewNotification {
        let (title, message, data, channels, priority) = match *self {
            NotificationEvent::VisitRequested(v) => (
                "New visit request".to_string(),
                format!(
                    "{} wants to visit on {} at {}. Fee: {} (your payout: {}).",
                    v.buyer_name,
                    v.visit_date,
                    v.visit_time.format("%H:%M"),
                    format_amount(v.visit_fee_amount, &v.currency),
                    format_amount(v.seller_payout, &v.currency)
                ),
                visit_data(v),
                vec![Channel::InApp, Channel::Email, Channel::Push],
                Priority::Normal,
            ),
            NotificationEvent::VisitPaymentConfirmed(v) => (
                "Visit fee payment confirmed".to_string(),
                format!(
                    "Payment {} for the visit on {} at {} has been confirmed.",
                    v.payment_reference,
                    v.visit_date,
                    v.visit_time.format("%H:%M")
                ),
                visit_data(v),
                vec![Channel::InApp, Channel::Email, Channel::Sms],
                Priority::High,
            ),
            NotificationEvent::PayoutReleased(v) => (
                "Payout released".to_string(),
                format!(
                    "Your payout of {} for visit {} has been released.",
                    format_amount(v.seller_payout, &v.currency),
                    v.payment_reference
                ),
                visit_data(v),
                vec![Channel::InApp, Channel::Email, Channel::Sms],
                Priority::High,
            ),
            NotificationEvent::VisitCancelled(v) => (
                "Visit request cancelled".to_string(),
                format!(
                    "The visit planned on {} ({}) has been cancelled.",
                    v.visit_date, v.payment_reference
                ),
                visit_data(v),
                vec![Channel::InApp, Channel::Email],
                Priority::Normal,
            ),
            NotificationEvent::VisitRefunded(v) => (
                "Visit fee refunded".to_string(),
                format!(
                    "Your visit fee of {} ({}) has been refunded.",
                    format_amount(v.visit_fee_amount, &v.currency),
                    v.payment_reference
                ),
                visit_data(v),
                vec![Channel::InApp, Channel::Email, Channel::Sms],
                Priority::High,
            ),
            NotificationEvent::InquiryReceived { inquiry, listing } => (
                format!("New inquiry about \"{}\"", listing.title),
                inquiry.message.clone(),
                json!({
                    "inquiry_id": inquiry.id,
                    "listing_id": listing.id,
                    "sender_id": inquiry.sender_id,
                    "contact_phone": inquiry.contact_phone,
                }),
                vec![Channel::InApp, Channel::Email],
                Priority::Normal,
            ),
            NotificationEvent::PromotionActivated(listing) => (
                "Your listing is now featured".to_string(),
                format!("\"{}\" is now shown first in search results.", listing.title),
                json!({ "listing_id": listing.id }),
                vec![Channel::InApp, Channel::Email],
                Priority::Low,
            ),
        };

        NewNotification {
            user_id,
            notification_type: self.notification_type().to_string(),
            title,
            message,
            data,
            channels,
            priority,
        }
    }
}

fn visit_data(v: &VisitRequest) -> serde_json::Value {
    json!({
        "visit_request_id": v.id,
        "listing_id": v.listing_id,
        "status": v.status,
        "payment_reference": v.payment_reference,
        "visit_fee_amount": v.visit_fee_amount,
        "platform_fee": v.platform_fee,
        "seller_payout": v.seller_payout,
        "currency": v.currency,
    })
}
