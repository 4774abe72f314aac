use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deskline_shared::{AppResult, SessionStore};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::NotificationApi;
use crate::config::AppConfig;
use crate::events::feed::NotificationFeed;
use crate::events::poller;
use crate::models::{Notification, NotificationId, NotificationStats};
use crate::route_policy::RoutePolicy;
use crate::services::registry::{self, ShownToastRegistry};
use crate::state::NotificationState;
use crate::toast::{DismissReason, Toast, ToastEvent, ToastTray, DEFAULT_TOAST_DURATION};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub toast_duration: Duration,
    pub route_policy: RoutePolicy,
    pub initial_route: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1200),
            toast_duration: DEFAULT_TOAST_DURATION,
            route_policy: RoutePolicy::default(),
            initial_route: "/dashboard".into(),
        }
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            toast_duration: config.toast_duration(),
            route_policy: RoutePolicy::new(config.public_prefixes()),
            initial_route: config.initial_route.clone(),
        }
    }
}

/// Owns the notification list, the unread count and the toast lifecycle for
/// one signed-in session.
///
/// Local state only changes after the backend confirmed a mutation, and the
/// unread count is derived from the list after every local change. No lock is
/// held across a backend call.
pub struct NotificationEngine {
    api: Arc<dyn NotificationApi>,
    feed: Arc<dyn NotificationFeed>,
    sessions: Arc<SessionStore>,
    registry: Mutex<ShownToastRegistry>,
    registry_writes: Mutex<()>,
    state: RwLock<NotificationState>,
    tray: ToastTray,
    policy: RoutePolicy,
    route: RwLock<String>,
    poll_interval: Duration,
    cancel: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationEngine {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        feed: Arc<dyn NotificationFeed>,
        sessions: Arc<SessionStore>,
        registry: ShownToastRegistry,
        settings: EngineSettings,
    ) -> Self {
        Self {
            api,
            feed,
            sessions,
            registry: Mutex::new(registry),
            registry_writes: Mutex::new(()),
            state: RwLock::new(NotificationState::default()),
            tray: ToastTray::new(settings.toast_duration),
            policy: settings.route_policy,
            route: RwLock::new(settings.initial_route),
            poll_interval: settings.poll_interval,
            cancel: CancellationToken::new(),
            poller: Mutex::new(None),
        }
    }

    pub(crate) fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub(crate) fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // --- Lifecycle ---

    /// Starts the background poller. Requires a valid session; calling it
    /// twice keeps the running poller.
    pub async fn start(self: &Arc<Self>) -> AppResult<()> {
        self.sessions.require()?;

        if self.cancel.is_cancelled() {
            tracing::warn!("engine already shut down, not starting poller");
            return Ok(());
        }

        let mut slot = self.poller.lock().await;
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }
        *slot = Some(poller::spawn_poller(self.clone(), self.poll_interval));
        Ok(())
    }

    /// Stops polling and tears down every toast timer. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.poller.lock().await.take() {
            handle.abort();
        }
        self.teardown().await;
    }

    /// Cancels the engine and closes the tray without touching the poller
    /// handle, so the poller can call it on its own way out.
    pub(crate) async fn teardown(&self) {
        self.cancel.cancel();
        let cleared = self.tray.close(DismissReason::Teardown).await;
        tracing::info!(toasts_cleared = cleared, "notification engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // --- Fetching ---

    /// Replaces the list with the server's. On failure the previous list is
    /// kept and, unless the session was rejected, `error` is set.
    pub async fn fetch_notifications(&self) -> AppResult<()> {
        self.state.write().await.loading = true;
        let result = self.api.list().await;

        let mut state = self.state.write().await;
        state.loading = false;

        match result {
            Ok(list) => {
                let now = Utc::now();
                let mut notifications: Vec<Notification> =
                    list.into_iter().map(|n| n.normalize(now)).collect();
                notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

                state.notifications = notifications;
                state.error = None;
                state.recount();
                tracing::debug!(
                    count = state.notifications.len(),
                    unread = state.unread_count,
                    "notifications fetched"
                );
                Ok(())
            }
            Err(e) if e.is_auth_failure() => {
                tracing::debug!(error = %e, "notification fetch rejected");
                Err(e)
            }
            Err(e) => {
                record_failure("fetch_notifications");
                tracing::warn!(error = %e, "failed to fetch notifications");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces `unread_count` with the server's scalar.
    pub async fn fetch_unread_count(&self) -> AppResult<u64> {
        match self.api.unread_count().await {
            Ok(count) => {
                self.state.write().await.unread_count = count;
                Ok(count)
            }
            Err(e) => {
                self.log_failure("fetch_unread_count", &e);
                Err(e)
            }
        }
    }

    pub async fn fetch_stats(&self) -> AppResult<NotificationStats> {
        match self.api.stats().await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                self.log_failure("fetch_stats", &e);
                Err(e)
            }
        }
    }

    /// One poll step: ask the feed what is new, toast first sightings and
    /// merge everything unseen into the list. Failures are only logged.
    pub async fn check_for_new(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(e) = self.sessions.require() {
            self.log_failure("check_for_new", &e);
            return;
        }

        let batch = match self.feed.fetch_new().await {
            Ok(batch) => batch,
            Err(e) => {
                self.log_failure("check_for_new", &e);
                return;
            }
        };

        let now = Utc::now();
        for notification in batch {
            self.ingest(notification.normalize(now)).await;
        }
    }

    async fn ingest(&self, notification: Notification) {
        if self.cancel.is_cancelled() {
            return;
        }
        let id = notification.id;

        let first_sighting = self.registry.lock().await.insert(id);
        if first_sighting {
            self.persist_registry().await;
            self.add_toast(notification.clone()).await;
        }

        if self.state.write().await.merge_new(notification) {
            tracing::debug!(notification_id = id, "new notification merged");
        }
    }

    /// Writes the registry with no lock held during the file write. Writers
    /// take snapshots in turn, so a later write always covers an earlier one.
    async fn persist_registry(&self) {
        let _turn = self.registry_writes.lock().await;
        let (store, ids) = self.registry.lock().await.snapshot();
        if let Err(e) = registry::write_snapshot(store, ids).await {
            tracing::warn!(error = %e, "failed to persist shown toast ids");
        }
    }

    // --- Mutations ---

    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<()> {
        if let Err(e) = self.api.mark_read(id).await {
            self.log_failure("mark_as_read", &e);
            return Err(e);
        }

        let mut state = self.state.write().await;
        if let Some(notification) = state.get_mut(id) {
            notification.mark_read(Utc::now());
        }
        state.recount();
        tracing::debug!(notification_id = id, unread = state.unread_count, "notification marked read");
        Ok(())
    }

    pub async fn mark_all_as_read(&self) -> AppResult<()> {
        if let Err(e) = self.api.mark_all_read().await {
            self.log_failure("mark_all_as_read", &e);
            return Err(e);
        }

        let now = Utc::now();
        let mut state = self.state.write().await;
        for notification in state.notifications.iter_mut() {
            notification.mark_read(now);
        }
        state.recount();
        tracing::debug!("all notifications marked read");
        Ok(())
    }

    pub async fn remove_notification(&self, id: NotificationId) -> AppResult<()> {
        if let Err(e) = self.api.delete(id).await {
            self.log_failure("remove_notification", &e);
            return Err(e);
        }

        if self.state.write().await.remove(id).is_some() {
            tracing::debug!(notification_id = id, "notification removed");
        }
        Ok(())
    }

    // --- Toasts ---

    /// Shows a toast unless the current route suppresses them.
    pub async fn add_toast(&self, notification: Notification) -> Option<Toast> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if !self.toasts_allowed().await {
            tracing::debug!(notification_id = notification.id, "toast suppressed on this route");
            return None;
        }

        let toast = self.tray.push(notification).await?;
        metrics::counter!("notify_toasts_shown_total").increment(1);
        Some(toast)
    }

    pub async fn dismiss_toast(&self, toast_id: Uuid) -> bool {
        self.tray.dismiss(toast_id, DismissReason::Closed).await.is_some()
    }

    /// Closes the toast, then marks its notification read on the server.
    pub async fn mark_toast_read(&self, toast_id: Uuid) -> AppResult<()> {
        match self.tray.dismiss(toast_id, DismissReason::MarkedRead).await {
            Some(toast) => self.mark_as_read(toast.notification.id).await,
            None => {
                tracing::debug!(toast_id = %toast_id, "toast already gone");
                Ok(())
            }
        }
    }

    /// Records the active route. Entering a route that suppresses toasts
    /// clears the visible ones.
    pub async fn set_route(&self, route: impl Into<String>) {
        let route = route.into();
        let allowed = self.policy.allows(&route, self.sessions.is_authenticated());
        tracing::debug!(route = %route, toasts_allowed = allowed, "route changed");
        *self.route.write().await = route;

        if !allowed {
            self.tray.clear(DismissReason::Suppressed).await;
        }
    }

    pub async fn current_route(&self) -> String {
        self.route.read().await.clone()
    }

    /// Visible toasts, oldest first. Always empty while suppressed.
    pub async fn visible_toasts(&self) -> Vec<Toast> {
        if !self.toasts_allowed().await {
            return Vec::new();
        }
        self.tray.visible().await
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<ToastEvent> {
        self.tray.subscribe()
    }

    pub async fn snapshot(&self) -> NotificationState {
        self.state.read().await.clone()
    }

    pub async fn shown_toast_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn toasts_allowed(&self) -> bool {
        let route = self.route.read().await;
        self.policy.allows(&route, self.sessions.is_authenticated())
    }

    /// Auth failures were already handed to the session handler by the client.
    fn log_failure(&self, op: &'static str, err: &deskline_shared::AppError) {
        if err.is_auth_failure() {
            tracing::debug!(op, error = %err, "request rejected by auth");
            return;
        }
        record_failure(op);
        tracing::warn!(op, error = %err, "notification request failed");
    }
}

fn record_failure(op: &'static str) {
    metrics::counter!("notify_request_failures_total", "op" => op).increment(1);
}
