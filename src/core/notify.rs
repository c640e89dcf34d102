//! Friend-request notifications.
//!
//! Delivery is best-effort. [`dispatch_friend_request`] runs the notifier on a
//! background task and only logs failures, so a slow or broken endpoint never
//! delays or fails the request that triggered it.

use crate::{
    config::settings::NotificationConfig,
    core::{friendship::FriendRequest, profile},
    errors::Result,
};
use async_trait::async_trait;
use reqwest::Client;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Payload describing a new friend request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestNotice {
    /// Who sent the request
    pub sender_user_id: String,
    /// Sender's display name (username, or user id when none is set)
    pub sender_name: String,
    /// Who should be told
    pub recipient_user_id: String,
    /// Recipient's email, when the profile has one
    pub recipient_email: Option<String>,
}

/// Something that can tell a user about an incoming friend request.
#[async_trait]
pub trait FriendNotifier: Send + Sync {
    /// Delivers one notice.
    async fn notify_friend_request(&self, notice: &FriendRequestNotice) -> Result<()>;
}

/// Writes notices to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl FriendNotifier for LogNotifier {
    async fn notify_friend_request(&self, notice: &FriendRequestNotice) -> Result<()> {
        info!(
            "Friend request from {} ({}) to {}",
            notice.sender_name, notice.sender_user_id, notice.recipient_user_id
        );
        Ok(())
    }
}

/// POSTs notices as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Creates a notifier for `endpoint` whose requests give up after `timeout`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FriendNotifier for WebhookNotifier {
    async fn notify_friend_request(&self, notice: &FriendRequestNotice) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(notice)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        debug!(
            "Delivered friend request notice for {} to {}",
            notice.recipient_user_id, self.endpoint
        );
        Ok(())
    }
}

/// The webhook endpoint configured for notices, ignoring blank values.
#[must_use]
pub fn webhook_endpoint(config: &NotificationConfig) -> Option<&str> {
    config
        .webhook_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Picks the notifier described by the configuration.
#[must_use]
pub fn notifier_from_config(config: &NotificationConfig) -> Arc<dyn FriendNotifier> {
    if let Some(url) = webhook_endpoint(config) {
        info!("Friend request notices go to {url}");
        Arc::new(WebhookNotifier::new(
            url,
            Duration::from_secs(config.timeout_secs),
        ))
    } else {
        info!("No notification webhook configured, logging friend requests only");
        Arc::new(LogNotifier)
    }
}

/// Builds the notice for a request that was just stored.
pub async fn notice_for_request<C>(db: &C, request: &FriendRequest) -> Result<FriendRequestNotice>
where
    C: ConnectionTrait,
{
    let sender_user_id = request.edge.requester_user_id.clone();
    let sender = profile::get_profile(db, &sender_user_id).await?;
    let recipient = profile::get_profile(db, &request.recipient.user_id).await?;

    Ok(FriendRequestNotice {
        sender_name: sender
            .and_then(|p| p.username)
            .unwrap_or_else(|| sender_user_id.clone()),
        sender_user_id,
        recipient_user_id: request.recipient.user_id.clone(),
        recipient_email: recipient.and_then(|p| p.email),
    })
}

/// Sends the notice on a background task. Failures are logged, never returned.
pub fn dispatch_friend_request(
    notifier: Arc<dyn FriendNotifier>,
    notice: FriendRequestNotice,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_friend_request(&notice).await {
            warn!(
                "Failed to notify {} about friend request from {}: {e}",
                notice.recipient_user_id, notice.sender_user_id
            );
        }
    })
}
