//! In-memory store used by service and router tests

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    FavoriteStore, InquiryStore, ListingStore, NotificationStore, PaymentMethodStore, Readiness, Stores,
    UserStore, VisitStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        inquiry::Inquiry,
        listing::{Listing, ListingQuery},
        notification::{
            ChannelDelivery, NewNotification, Notification, NotificationPreferences, NotificationQuery,
            NotificationStatus,
        },
        payment_method::{PaymentMethod, UpsertPaymentMethod},
        user::{UserProfile, UserRole},
        visit::{NewVisitRequest, VisitFilter, VisitRequest, VisitStatus, VisitStatusTotals, VisitTransition},
        Page,
    },
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserProfile>,
    listings: HashMap<Uuid, Listing>,
    visits: Vec<VisitRequest>,
    notifications: Vec<Notification>,
    preferences: HashMap<Uuid, NotificationPreferences>,
    favorites: Vec<(Uuid, Uuid)>,
    inquiries: Vec<Inquiry>,
    payment_methods: Vec<PaymentMethod>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn paginate<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .cloned()
        .collect()
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            listings: self.clone(),
            users: self.clone(),
            visits: self.clone(),
            notifications: self.clone(),
            favorites: self.clone(),
            inquiries: self.clone(),
            payment_methods: self.clone(),
            readiness: self.clone(),
        }
    }

    pub fn add_user(&self, role: UserRole) -> UserProfile {
        let id = Uuid::new_v4();
        let user = UserProfile {
            id,
            full_name: Some(format!("User {}", &id.to_string()[..8])),
            email: Some(format!("{}@example.com", &id.to_string()[..8])),
            phone: Some("+233200000000".to_string()),
            role,
            created_at: Utc::now(),
        };
        self.lock().users.insert(id, user.clone());
        user
    }

    pub fn add_listing(&self, listing: Listing) -> Listing {
        self.lock().listings.insert(listing.id, listing.clone());
        listing
    }

    /// Force a status, bypassing the lifecycle
    pub fn set_visit_status(&self, id: Uuid, status: VisitStatus) {
        if let Some(visit) = self.lock().visits.iter_mut().find(|v| v.id == id) {
            visit.status = status;
        }
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.lock()
            .listings
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
    }

    async fn search(&self, query: &ListingQuery, page: Page) -> AppResult<(Vec<Listing>, i64)> {
        let mut rows: Vec<Listing> = self
            .lock()
            .listings
            .values()
            .filter(|l| query.matches(l))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.featured.cmp(&a.featured).then(b.created_at.cmp(&a.created_at)));
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        let mut state = self.lock();
        let listing = state
            .listings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;
        listing.featured = featured;
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.lock().users.get(&id).cloned())
    }
}

/// Audit fields written when entering a status
fn audit_slots(
    visit: &mut VisitRequest,
    to: VisitStatus,
) -> AppResult<(&mut Option<Uuid>, &mut Option<DateTime<Utc>>)> {
    match to {
        VisitStatus::PaymentConfirmed => Ok((&mut visit.confirmed_by, &mut visit.confirmed_at)),
        VisitStatus::PayoutReleased => Ok((&mut visit.released_by, &mut visit.released_at)),
        VisitStatus::Cancelled => Ok((&mut visit.cancelled_by, &mut visit.cancelled_at)),
        VisitStatus::Refunded => Ok((&mut visit.refunded_by, &mut visit.refunded_at)),
        VisitStatus::AwaitingPayment => Err(AppError::Internal(
            "awaiting_payment is only set at creation".to_string(),
        )),
    }
}

#[async_trait]
impl VisitStore for MemoryStore {
    async fn insert(&self, visit: NewVisitRequest) -> AppResult<VisitRequest> {
        let mut state = self.lock();
        if let Some(ref key) = visit.idempotency_key {
            let taken = state
                .visits
                .iter()
                .any(|v| v.buyer_id == visit.buyer_id && v.idempotency_key.as_ref() == Some(key));
            if taken {
                return Err(AppError::Conflict(
                    "A visit request with this idempotency key already exists".to_string(),
                ));
            }
        }
        let row = visit.into_request();
        state.visits.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> AppResult<VisitRequest> {
        self.lock()
            .visits
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Visit request {} not found", id)))
    }

    async fn find_by_idempotency_key(&self, buyer_id: Uuid, key: &str) -> AppResult<Option<VisitRequest>> {
        Ok(self
            .lock()
            .visits
            .iter()
            .find(|v| v.buyer_id == buyer_id && v.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn list(&self, filter: &VisitFilter, page: Page) -> AppResult<(Vec<VisitRequest>, i64)> {
        let mut rows: Vec<VisitRequest> = self
            .lock()
            .visits
            .iter()
            .filter(|v| filter.status.map_or(true, |s| v.status == s))
            .filter(|v| filter.listing_id.map_or(true, |id| v.listing_id == id))
            .filter(|v| filter.buyer_id.map_or(true, |id| v.buyer_id == id))
            .filter(|v| filter.seller_id.map_or(true, |id| v.seller_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    async fn transition(&self, id: Uuid, change: &VisitTransition) -> AppResult<Option<VisitRequest>> {
        let mut state = self.lock();
        let Some(visit) = state
            .visits
            .iter_mut()
            .find(|v| v.id == id && v.status == change.from)
        else {
            return Ok(None);
        };

        let (by, at) = audit_slots(visit, change.to)?;
        *by = Some(change.actor);
        *at = Some(change.at);
        visit.status = change.to;
        visit.updated_at = change.at;
        if change.payment_transaction_id.is_some() {
            visit.payment_transaction_id = change.payment_transaction_id.clone();
        }
        if change.reason.is_some() {
            visit.refund_reason = change.reason.clone();
        }
        Ok(Some(visit.clone()))
    }

    async fn totals_by_status(&self) -> AppResult<Vec<VisitStatusTotals>> {
        let state = self.lock();
        Ok(VisitStatus::ALL
            .into_iter()
            .filter_map(|status| {
                let rows: Vec<&VisitRequest> = state.visits.iter().filter(|v| v.status == status).collect();
                (!rows.is_empty()).then(|| VisitStatusTotals {
                    status,
                    count: rows.len() as i64,
                    fee_total: rows.iter().map(|v| v.visit_fee_amount).sum(),
                    platform_fee_total: rows.iter().map(|v| v.platform_fee).sum(),
                    seller_payout_total: rows.iter().map(|v| v.seller_payout).sum(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, id: Uuid, notification: NewNotification, created_at: DateTime<Utc>) -> AppResult<Notification> {
        let row = notification.into_pending(id, created_at);
        self.lock().notifications.push(row.clone());
        Ok(row)
    }

    async fn record_dispatch(
        &self,
        id: Uuid,
        status: NotificationStatus,
        deliveries: &[ChannelDelivery],
        sent_at: DateTime<Utc>,
    ) -> AppResult<Notification> {
        let mut state = self.lock();
        let row = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;
        row.status = status;
        row.deliveries = deliveries.to_vec();
        row.sent_at = Some(sent_at);
        Ok(row.clone())
    }

    async fn list(&self, user_id: Uuid, query: &NotificationQuery, page: Page) -> AppResult<(Vec<Notification>, i64)> {
        let unread_only = query.unread_only.unwrap_or(false);
        let mut rows: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| !unread_only || !n.is_read)
            .filter(|n| {
                query
                    .notification_type
                    .as_deref()
                    .map_or(true, |t| n.notification_type == t)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.lock();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(row) => {
                row.is_read = true;
                row.read_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let mut count = 0;
        for row in self
            .lock()
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            row.is_read = true;
            row.read_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(state.notifications.len() < before)
    }

    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>> {
        Ok(self.lock().preferences.get(&user_id).cloned())
    }

    async fn save_preferences(&self, preferences: &NotificationPreferences) -> AppResult<NotificationPreferences> {
        self.lock()
            .preferences
            .insert(preferences.user_id, preferences.clone());
        Ok(preferences.clone())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn add(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        if state.favorites.contains(&(user_id, listing_id)) {
            return Ok(false);
        }
        state.favorites.push((user_id, listing_id));
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        let before = state.favorites.len();
        state.favorites.retain(|f| *f != (user_id, listing_id));
        Ok(state.favorites.len() < before)
    }

    async fn list(&self, user_id: Uuid) -> AppResult<Vec<Listing>> {
        let state = self.lock();
        Ok(state
            .favorites
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, listing_id)| state.listings.get(listing_id).cloned())
            .collect())
    }
}

#[async_trait]
impl InquiryStore for MemoryStore {
    async fn insert(&self, inquiry: &Inquiry) -> AppResult<Inquiry> {
        self.lock().inquiries.push(inquiry.clone());
        Ok(inquiry.clone())
    }

    async fn list_for_seller(&self, seller_id: Uuid, page: Page) -> AppResult<(Vec<Inquiry>, i64)> {
        let mut rows: Vec<Inquiry> = self
            .lock()
            .inquiries
            .iter()
            .filter(|i| i.seller_id == seller_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((paginate(&rows, page), rows.len() as i64))
    }
}

#[async_trait]
impl PaymentMethodStore for MemoryStore {
    async fn list(&self, active_only: bool) -> AppResult<Vec<PaymentMethod>> {
        let mut rows: Vec<PaymentMethod> = self
            .lock()
            .payment_methods
            .iter()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.sort_order);
        Ok(rows)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<PaymentMethod>> {
        Ok(self
            .lock()
            .payment_methods
            .iter()
            .find(|m| m.code == code)
            .cloned())
    }

    async fn upsert(&self, code: &str, data: &UpsertPaymentMethod) -> AppResult<PaymentMethod> {
        let mut state = self.lock();
        let now = Utc::now();
        if let Some(existing) = state.payment_methods.iter_mut().find(|m| m.code == code) {
            existing.display_name = data.display_name.clone();
            existing.instructions = data.instructions.clone().or(existing.instructions.take());
            existing.account_details = data.account_details.clone().or(existing.account_details.take());
            existing.is_active = data.is_active.unwrap_or(existing.is_active);
            existing.sort_order = data.sort_order.unwrap_or(existing.sort_order);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            code: code.to_string(),
            display_name: data.display_name.clone(),
            instructions: data.instructions.clone(),
            account_details: data.account_details.clone(),
            is_active: data.is_active.unwrap_or(true),
            sort_order: data.sort_order.unwrap_or(0),
            updated_at: now,
        };
        state.payment_methods.push(method.clone());
        Ok(method)
    }
}

#[async_trait]
impl Readiness for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::CreateVisitRequest;

    #[tokio::test]
    async fn test_rejected_transition_leaves_row_untouched() {
        let store = MemoryStore::new();
        let contact = CreateVisitRequest {
            listing_id: Uuid::new_v4(),
            buyer_name: Some("Esi".to_string()),
            buyer_email: Some("esi@example.com".to_string()),
            buyer_phone: Some("0200000000".to_string()),
            visit_date: Some("2026-12-05".to_string()),
            visit_time: Some("09:30".to_string()),
            ..Default::default()
        }
        .contact()
        .unwrap();
        let created = VisitStore::insert(
            store.as_ref(),
            NewVisitRequest {
                id: Uuid::new_v4(),
                listing_id: Uuid::new_v4(),
                buyer_id: Uuid::new_v4(),
                seller_id: Uuid::new_v4(),
                contact,
                payment_method: None,
                visit_fee_amount: 10_000,
                platform_fee: 3_000,
                seller_payout: 7_000,
                currency: "GHS".to_string(),
                payment_reference: "VR-000001-ABCDEFGH".to_string(),
                idempotency_key: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        let back_to_awaiting = VisitTransition {
            from: VisitStatus::AwaitingPayment,
            to: VisitStatus::AwaitingPayment,
            actor: Uuid::new_v4(),
            at: Utc::now() + chrono::Duration::hours(1),
            payment_transaction_id: Some("TX-1".to_string()),
            reason: None,
        };
        assert!(matches!(
            store.transition(created.id, &back_to_awaiting).await,
            Err(AppError::Internal(_))
        ));

        let row = VisitStore::get(store.as_ref(), created.id).await.unwrap();
        assert_eq!(row.status, VisitStatus::AwaitingPayment);
        assert_eq!(row.updated_at, created.updated_at);
        assert!(row.payment_transaction_id.is_none());
    }
}
