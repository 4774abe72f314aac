//! Sources of newly created notifications.
//!
//! The engine only asks a [`NotificationFeed`] "what is new?". Polling the
//! backend is one answer; a push transport (websocket, SSE) can feed the same
//! engine through [`PushFeed`].

use std::sync::Arc;

use async_trait::async_trait;
use deskline_shared::AppResult;
use tokio::sync::{mpsc, Mutex};

use crate::api::NotificationApi;
use crate::models::Notification;

#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// Notifications that appeared since the previous call. Usually empty.
    async fn fetch_new(&self) -> AppResult<Vec<Notification>>;
}

/// Cheap check first, then fetch the single most recent notification.
///
/// If several notifications arrive between two checks only the newest one is
/// returned; the others still show up in the next full list fetch.
pub struct PollingFeed {
    api: Arc<dyn NotificationApi>,
}

impl PollingFeed {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NotificationFeed for PollingFeed {
    async fn fetch_new(&self) -> AppResult<Vec<Notification>> {
        if !self.api.check_new().await? {
            return Ok(Vec::new());
        }

        match self.api.latest().await? {
            Some(notification) => Ok(vec![notification]),
            None => {
                tracing::debug!("check-new reported new items but latest was empty");
                Ok(Vec::new())
            }
        }
    }
}

/// Feed backed by a channel that a push transport writes into.
pub struct PushFeed {
    rx: Mutex<mpsc::UnboundedReceiver<Notification>>,
}

impl PushFeed {
    pub fn channel() -> (mpsc::UnboundedSender<Notification>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx: Mutex::new(rx) })
    }
}

#[async_trait]
impl NotificationFeed for PushFeed {
    async fn fetch_new(&self) -> AppResult<Vec<Notification>> {
        let mut rx = self.rx.lock().await;
        let mut batch = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            batch.push(notification);
        }
        Ok(batch)
    }
}
