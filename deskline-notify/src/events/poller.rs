use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::sync_engine::NotificationEngine;

/// Drives `check_for_new` on a fixed period until the engine is cancelled or
/// the session is cleared.
///
/// Ticks never overlap: a slow poll delays the next one instead of stacking.
pub fn spawn_poller(engine: Arc<NotificationEngine>, period: Duration) -> JoinHandle<()> {
    let cancel = engine.cancellation();
    let mut session_rx = engine.sessions().subscribe();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(period_ms = period.as_millis() as u64, "notification poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("poller cancelled");
                    break;
                }
                changed = session_rx.changed() => {
                    let logged_out = changed.is_err() || session_rx.borrow_and_update().is_none();
                    if logged_out {
                        tracing::info!("session cleared, stopping notification poller");
                        engine.teardown().await;
                        break;
                    }
                }
                _ = ticker.tick() => {
                    metrics::counter!("notify_poll_ticks_total").increment(1);
                    engine.check_for_new().await;
                }
            }
        }

        tracing::info!("notification poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskline_shared::clients::LocalStore;
    use deskline_shared::{Session, SessionStore};

    use crate::api::NotificationApi;
    use crate::events::feed::PushFeed;
    use crate::models::{Notification, NotificationId, NotificationStats};
    use crate::services::registry::ShownToastRegistry;
    use crate::services::sync_engine::EngineSettings;
    use async_trait::async_trait;
    use deskline_shared::AppResult;

    struct NoopApi;

    #[async_trait]
    impl NotificationApi for NoopApi {
        async fn list(&self) -> AppResult<Vec<Notification>> {
            Ok(Vec::new())
        }
        async fn unread_count(&self) -> AppResult<u64> {
            Ok(0)
        }
        async fn check_new(&self) -> AppResult<bool> {
            Ok(false)
        }
        async fn latest(&self) -> AppResult<Option<Notification>> {
            Ok(None)
        }
        async fn mark_read(&self, _id: NotificationId) -> AppResult<()> {
            Ok(())
        }
        async fn mark_all_read(&self) -> AppResult<()> {
            Ok(())
        }
        async fn delete(&self, _id: NotificationId) -> AppResult<()> {
            Ok(())
        }
        async fn stats(&self) -> AppResult<NotificationStats> {
            Ok(NotificationStats::default())
        }
    }

    fn notification(id: NotificationId) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "mention",
            "created_at": "2026-10-01T08:00:00Z",
        }))
        .unwrap()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_each_tick_and_stops_on_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let sessions = Arc::new(SessionStore::load(store.clone()));
        sessions.login(Session::new("tok", None)).unwrap();

        let (tx, feed) = PushFeed::channel();
        let engine = Arc::new(NotificationEngine::new(
            Arc::new(NoopApi),
            Arc::new(feed),
            sessions.clone(),
            ShownToastRegistry::load(store),
            EngineSettings::default(),
        ));
        engine.start().await.unwrap();
        settle().await;

        tx.send(notification(1)).unwrap();
        tokio::time::advance(Duration::from_millis(1200)).await;
        // The registry write runs on the blocking pool; paused time waits for it.
        for _ in 0..50 {
            if engine.visible_toasts().await.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(engine.snapshot().await.notifications.len(), 1);
        assert_eq!(engine.visible_toasts().await.len(), 1);

        sessions.logout().unwrap();
        settle().await;
        assert!(engine.is_shut_down());
        assert!(engine.visible_toasts().await.is_empty());

        // Nothing is polled after teardown.
        tx.send(notification(2)).unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(engine.snapshot().await.notifications.len(), 1);
    }
}
