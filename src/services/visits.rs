//! Visit request workflow: fee split, payment confirmation and payout release

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use super::{
    fees::FeePolicy, notifications::NotificationsService, payment_methods::PaymentMethodsService,
    templates::NotificationEvent, users::UsersService,
};
use crate::{
    config::{PaginationConfig, VisitsConfig},
    error::{AppError, AppResult},
    models::{
        listing::{Listing, ListingStatus},
        visit::{
            ConfirmPayment, CreateVisitRequest, NewVisitRequest, VisitFilter, VisitQuery, VisitRequest,
            VisitRequestDetails, VisitStatus, VisitSummary, VisitTransition,
        },
        Page,
    },
    repository::{ListingStore, VisitStore},
};

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Result of a create call. `created` is false on an idempotent replay.
#[derive(Debug)]
pub struct CreatedVisit {
    pub request: VisitRequest,
    pub created: bool,
}

#[derive(Clone)]
pub struct VisitsService {
    visits: Arc<dyn VisitStore>,
    listings: Arc<dyn ListingStore>,
    users: UsersService,
    payment_methods: PaymentMethodsService,
    notifications: NotificationsService,
    fees: FeePolicy,
    config: VisitsConfig,
    pagination: PaginationConfig,
}

/// `{prefix}-{YYMMDD}-{8 uppercase alphanumerics}`
fn payment_reference(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", prefix, Utc::now().format("%y%m%d"), suffix)
}

impl VisitsService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        visits: Arc<dyn VisitStore>,
        listings: Arc<dyn ListingStore>,
        users: UsersService,
        payment_methods: PaymentMethodsService,
        notifications: NotificationsService,
        fees: FeePolicy,
        config: VisitsConfig,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            visits,
            listings,
            users,
            payment_methods,
            notifications,
            fees,
            config,
            pagination,
        }
    }

    /// Book a visit. The fee always comes from the listing.
    pub async fn create(
        &self,
        buyer_id: Uuid,
        data: &CreateVisitRequest,
        idempotency_key: Option<&str>,
    ) -> AppResult<CreatedVisit> {
        let idempotency_key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        if idempotency_key.is_some_and(|k| k.len() > MAX_IDEMPOTENCY_KEY_LEN) {
            return Err(AppError::Validation("Idempotency-Key is too long".to_string()));
        }
        self.users.require(buyer_id).await?;
        if let Some(key) = idempotency_key {
            if let Some(existing) = self.visits.find_by_idempotency_key(buyer_id, key).await? {
                return replay(existing, data.listing_id);
            }
        }

        let contact = data.contact()?;
        let listing = self.listings.get(data.listing_id).await?;
        if listing.status != ListingStatus::Available {
            return Err(AppError::NotFound(format!(
                "Listing {} is not available",
                listing.id
            )));
        }
        if listing.seller_id == buyer_id {
            return Err(AppError::Validation(
                "You cannot request a visit to your own listing".to_string(),
            ));
        }
        let fee = visit_fee(&listing)?;

        let payment_method = match data.payment_method.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(self.payment_methods.require_active(code).await?),
            _ => None,
        };

        let split = self.fees.split(fee)?;
        let new = NewVisitRequest {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            buyer_id,
            seller_id: listing.seller_id,
            contact,
            payment_method,
            visit_fee_amount: split.total,
            platform_fee: split.platform_fee,
            seller_payout: split.seller_payout,
            currency: listing.currency.clone(),
            payment_reference: payment_reference(&self.config.reference_prefix),
            idempotency_key: idempotency_key.map(str::to_string),
            created_at: Utc::now(),
        };

        let request = match (self.visits.insert(new).await, idempotency_key) {
            (Ok(request), _) => request,
            // Lost a race against a concurrent request with the same key
            (Err(AppError::Conflict(_)), Some(key)) => {
                let existing = self
                    .visits
                    .find_by_idempotency_key(buyer_id, key)
                    .await?
                    .ok_or_else(|| AppError::Internal("Idempotent visit request vanished".to_string()))?;
                return replay(existing, data.listing_id);
            }
            (Err(e), _) => return Err(e),
        };

        tracing::info!(
            "Visit request {} created for listing {} (fee {}, platform {}, seller {})",
            request.id,
            request.listing_id,
            request.visit_fee_amount,
            request.platform_fee,
            request.seller_payout
        );
        self.notifications
            .notify(request.seller_id, NotificationEvent::VisitRequested(&request))
            .await;

        Ok(CreatedVisit {
            request,
            created: true,
        })
    }

    /// Admin confirmation that the buyer paid out of band
    pub async fn confirm_payment(&self, id: Uuid, admin_id: Uuid, data: &ConfirmPayment) -> AppResult<VisitRequest> {
        if let Some(reference) = data.payment_reference.as_deref().map(str::trim) {
            let current = self.visits.get(id).await?;
            if !reference.eq_ignore_ascii_case(&current.payment_reference) {
                return Err(AppError::Validation(
                    "Payment reference does not match this visit request".to_string(),
                ));
            }
        }
        let transaction_id = data
            .payment_transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let request = self
            .transition(
                id,
                VisitStatus::AwaitingPayment,
                VisitStatus::PaymentConfirmed,
                admin_id,
                transaction_id,
                None,
            )
            .await?;

        let event = NotificationEvent::VisitPaymentConfirmed(&request);
        self.notifications.notify(request.buyer_id, event).await;
        self.notifications.notify(request.seller_id, event).await;
        Ok(request)
    }

    /// Mark the seller payout as released. Bookkeeping only; no funds move.
    pub async fn release(&self, id: Uuid, admin_id: Uuid) -> AppResult<VisitRequest> {
        let request = self
            .transition(
                id,
                VisitStatus::PaymentConfirmed,
                VisitStatus::PayoutReleased,
                admin_id,
                None,
                None,
            )
            .await?;

        self.notifications
            .notify(request.seller_id, NotificationEvent::PayoutReleased(&request))
            .await;
        Ok(request)
    }

    /// Buyer or admin cancels an unpaid request
    pub async fn cancel(&self, id: Uuid, caller_id: Uuid) -> AppResult<VisitRequest> {
        let current = self.visits.get(id).await?;
        if current.buyer_id != caller_id && !self.users.is_admin(caller_id).await? {
            return Err(AppError::Authorization(
                "Only the buyer or an admin can cancel this visit request".to_string(),
            ));
        }

        let request = self
            .transition(
                id,
                VisitStatus::AwaitingPayment,
                VisitStatus::Cancelled,
                caller_id,
                None,
                None,
            )
            .await?;

        let event = NotificationEvent::VisitCancelled(&request);
        self.notifications.notify(request.seller_id, event).await;
        if request.buyer_id != caller_id {
            self.notifications.notify(request.buyer_id, event).await;
        }
        Ok(request)
    }

    /// Admin refund of a confirmed payment whose payout was not released
    pub async fn refund(&self, id: Uuid, admin_id: Uuid, reason: Option<&str>) -> AppResult<VisitRequest> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty()).map(str::to_string);
        let request = self
            .transition(
                id,
                VisitStatus::PaymentConfirmed,
                VisitStatus::Refunded,
                admin_id,
                None,
                reason,
            )
            .await?;

        self.notifications
            .notify(request.buyer_id, NotificationEvent::VisitRefunded(&request))
            .await;
        Ok(request)
    }

    /// Visible to the buyer, the seller and admins
    pub async fn get(&self, id: Uuid, caller_id: Uuid) -> AppResult<VisitRequest> {
        let request = self.visits.get(id).await?;
        if request.buyer_id == caller_id || request.seller_id == caller_id || self.users.is_admin(caller_id).await? {
            Ok(request)
        } else {
            Err(AppError::Authorization(
                "You do not have access to this visit request".to_string(),
            ))
        }
    }

    pub async fn list_for_buyer(&self, buyer_id: Uuid, query: &VisitQuery) -> AppResult<(Vec<VisitRequest>, i64)> {
        let filter = VisitFilter {
            buyer_id: Some(buyer_id),
            ..self.filter(query)
        };
        self.visits.list(&filter, self.page(query)).await
    }

    pub async fn list_for_seller(&self, seller_id: Uuid, query: &VisitQuery) -> AppResult<(Vec<VisitRequest>, i64)> {
        let filter = VisitFilter {
            seller_id: Some(seller_id),
            ..self.filter(query)
        };
        self.visits.list(&filter, self.page(query)).await
    }

    /// Every request, joined with listing title and category
    pub async fn list_all(&self, query: &VisitQuery) -> AppResult<(Vec<VisitRequestDetails>, i64)> {
        let (requests, total) = self.visits.list(&self.filter(query), self.page(query)).await?;

        let mut listings: HashMap<Uuid, Option<Listing>> = HashMap::new();
        let mut details = Vec::with_capacity(requests.len());
        for request in requests {
            if !listings.contains_key(&request.listing_id) {
                let listing = match self.listings.get(request.listing_id).await {
                    Ok(listing) => Some(listing),
                    Err(AppError::NotFound(_)) => None,
                    Err(e) => return Err(e),
                };
                listings.insert(request.listing_id, listing);
            }
            let listing = listings.get(&request.listing_id).and_then(Option::as_ref);
            details.push(VisitRequestDetails {
                listing_title: listing.map(|l| l.title.clone()),
                listing_category: listing.map(|l| l.category),
                request,
            });
        }
        Ok((details, total))
    }

    pub async fn summary(&self) -> AppResult<VisitSummary> {
        let totals = self.visits.totals_by_status().await?;
        Ok(VisitSummary::from_totals(self.fees.platform_fee_bps(), totals))
    }

    fn filter(&self, query: &VisitQuery) -> VisitFilter {
        VisitFilter {
            status: query.status,
            listing_id: query.listing_id,
            ..Default::default()
        }
    }

    fn page(&self, query: &VisitQuery) -> Page {
        Page::resolve(
            query.page,
            query.per_page,
            self.pagination.default_per_page,
            self.pagination.max_per_page,
        )
    }

    /// Conditional status change. A row that is missing yields `NotFound`,
    /// one in any other status `InvalidState`.
    async fn transition(
        &self,
        id: Uuid,
        from: VisitStatus,
        to: VisitStatus,
        actor: Uuid,
        payment_transaction_id: Option<String>,
        reason: Option<String>,
    ) -> AppResult<VisitRequest> {
        debug_assert!(from.can_transition_to(to));
        let change = VisitTransition {
            from,
            to,
            actor,
            at: Utc::now(),
            payment_transaction_id,
            reason,
        };

        match self.visits.transition(id, &change).await? {
            Some(request) => {
                tracing::info!("Visit request {} moved {} -> {} by {}", id, from, to, actor);
                Ok(request)
            }
            None => {
                let current = self.visits.get(id).await?;
                Err(AppError::InvalidState(format!(
                    "Visit request {} is {}, expected {}",
                    id, current.status, from
                )))
            }
        }
    }
}

fn visit_fee(listing: &Listing) -> AppResult<i64> {
    match listing.visit_fee {
        Some(fee) if fee > 0 => Ok(fee),
        _ => Err(AppError::InvalidState(format!(
            "Listing {} does not accept visit requests",
            listing.id
        ))),
    }
}

fn replay(existing: VisitRequest, listing_id: Uuid) -> AppResult<CreatedVisit> {
    if existing.listing_id != listing_id {
        return Err(AppError::Conflict(
            "Idempotency-Key was already used for another listing".to_string(),
        ));
    }
    Ok(CreatedVisit {
        request: existing,
        created: false,
    })
}
