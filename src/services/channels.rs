//! Delivery channels used by the notification dispatcher

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::models::{
    notification::{Channel, ChannelOutcome, Notification},
    user::UserProfile,
};

/// Contact details of the user a notification is addressed to
#[derive(Debug, Clone, Default)]
pub struct Recipient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&UserProfile> for Recipient {
    fn from(user: &UserProfile) -> Self {
        Self {
            name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// One delivery medium. Senders report every failure as an outcome and never
/// return an error, so one channel cannot abort the others.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, recipient: &Recipient, notification: &Notification) -> ChannelOutcome;
}

/// The stored row is the in-app delivery
pub struct InAppSender;

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, _recipient: &Recipient, _notification: &Notification) -> ChannelOutcome {
        ChannelOutcome::Delivered
    }
}

/// Sender lookup by channel
#[derive(Clone, Default)]
pub struct ChannelSenders {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl ChannelSenders {
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        Self {
            senders: senders.into_iter().map(|s| (s.channel(), s)).collect(),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn ChannelSender>> {
        self.senders.get(&channel)
    }
}
