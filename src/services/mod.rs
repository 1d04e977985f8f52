//! Business logic services

pub mod channels;
pub mod email;
pub mod favorites;
pub mod fees;
pub mod gateway;
pub mod inquiries;
pub mod listings;
pub mod notifications;
pub mod payment_methods;
pub mod templates;
pub mod users;
pub mod visits;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::AppResult,
    models::notification::Channel,
    repository::{Readiness, Stores},
};

use channels::{ChannelSender, ChannelSenders, InAppSender};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub listings: listings::ListingsService,
    pub favorites: favorites::FavoritesService,
    pub inquiries: inquiries::InquiriesService,
    pub visits: visits::VisitsService,
    pub notifications: notifications::NotificationsService,
    pub payment_methods: payment_methods::PaymentMethodsService,
    pub users: users::UsersService,
    pub readiness: Arc<dyn Readiness>,
}

impl Services {
    /// Create all services with the configured delivery channels
    pub fn new(stores: Stores, config: &AppConfig) -> AppResult<Self> {
        let senders: Vec<Arc<dyn ChannelSender>> = vec![
            Arc::new(InAppSender),
            Arc::new(email::EmailSender::new(config.email.clone())?),
            Arc::new(gateway::GatewaySender::new(Channel::Sms, config.sms.clone())?),
            Arc::new(gateway::GatewaySender::new(Channel::Push, config.push.clone())?),
        ];
        Self::with_senders(stores, config, ChannelSenders::new(senders))
    }

    pub fn with_senders(stores: Stores, config: &AppConfig, senders: ChannelSenders) -> AppResult<Self> {
        let fees = fees::FeePolicy::new(config.fees.platform_fee_bps)?;
        let pagination = config.pagination.clone();

        let notifications = notifications::NotificationsService::new(
            stores.notifications.clone(),
            stores.users.clone(),
            senders,
            pagination.clone(),
        );
        let users = users::UsersService::new(stores.users.clone());
        let payment_methods = payment_methods::PaymentMethodsService::new(stores.payment_methods.clone());

        Ok(Self {
            listings: listings::ListingsService::new(
                stores.listings.clone(),
                notifications.clone(),
                pagination.clone(),
            ),
            favorites: favorites::FavoritesService::new(
                stores.favorites.clone(),
                stores.listings.clone(),
                users.clone(),
            ),
            inquiries: inquiries::InquiriesService::new(
                stores.inquiries.clone(),
                stores.listings.clone(),
                users.clone(),
                notifications.clone(),
                pagination.clone(),
            ),
            visits: visits::VisitsService::new(
                stores.visits.clone(),
                stores.listings.clone(),
                users.clone(),
                payment_methods.clone(),
                notifications.clone(),
                fees,
                config.visits.clone(),
                pagination,
            ),
            notifications,
            payment_methods,
            users,
            readiness: stores.readiness,
        })
    }
}
