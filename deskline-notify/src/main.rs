use std::sync::Arc;

use chrono::Utc;
use deskline_shared::clients::{ApiClient, LocalStore};
use deskline_shared::{ForceLogout, Session, SessionStore};
use tokio::sync::broadcast::error::RecvError;

use deskline_notify::services::ShownToastRegistry;
use deskline_notify::toast::format;
use deskline_notify::{
    AppConfig, EngineSettings, HttpNotificationApi, NotificationEngine, PollingFeed, ToastEvent,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    deskline_shared::telemetry::init_tracing("deskline-notify");

    let config = AppConfig::load()?;
    config.log_summary();

    let store = match &config.data_dir {
        Some(dir) => LocalStore::open(dir)?,
        None => LocalStore::open_default()?,
    };

    let sessions = Arc::new(SessionStore::load(store.clone()));
    if let Ok(token) = std::env::var("DESKLINE_TOKEN") {
        if !token.trim().is_empty() {
            sessions.login(Session::new(token.trim(), None))?;
        }
    }
    if let Err(e) = sessions.require() {
        anyhow::bail!("no usable session ({e}); set DESKLINE_TOKEN or sign in first");
    }

    let auth_errors = Arc::new(ForceLogout::new(sessions.clone()));
    let client = ApiClient::new(
        &config.api_base_url,
        config.request_timeout(),
        sessions.clone(),
        auth_errors,
    )?;
    let api = Arc::new(HttpNotificationApi::new(client));
    let feed = Arc::new(PollingFeed::new(api.clone()));

    let engine = Arc::new(NotificationEngine::new(
        api,
        feed,
        sessions.clone(),
        ShownToastRegistry::load(store),
        EngineSettings::from(&config),
    ));

    // Startup fetches are best effort; the poller keeps going either way.
    if let Err(e) = engine.fetch_notifications().await {
        tracing::warn!(error = %e, "initial notification fetch failed");
    }
    if let Err(e) = engine.fetch_unread_count().await {
        tracing::warn!(error = %e, "initial unread count fetch failed");
    }
    match engine.fetch_stats().await {
        Ok(stats) => tracing::info!(
            total = stats.total,
            unread = stats.unread,
            read = stats.read,
            deleted = stats.deleted,
            "notification stats"
        ),
        Err(e) => tracing::warn!(error = %e, "failed to fetch notification stats"),
    }

    let state = engine.snapshot().await;
    let now = Utc::now();
    for notification in state.notifications.iter().filter(|n| n.is_unread()).take(10) {
        tracing::info!("{}", format::toast_line(notification, now));
    }

    engine.set_route(config.initial_route.clone()).await;
    engine.start().await?;

    let mut toasts = engine.subscribe_toasts();
    let toast_logger = tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(ToastEvent::Shown(toast)) => {
                    tracing::info!(
                        toast_id = %toast.toast_id,
                        notification_id = toast.notification.id,
                        "{}",
                        format::toast_line(&toast.notification, Utc::now())
                    );
                }
                Ok(ToastEvent::Dismissed { toast_id, notification_id, reason }) => {
                    tracing::debug!(toast_id = %toast_id, notification_id, ?reason, "toast dismissed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "toast log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut session_rx = sessions.subscribe();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
        }
        _ = async {
            while session_rx.changed().await.is_ok() {
                if session_rx.borrow_and_update().is_none() {
                    break;
                }
            }
        } => {
            tracing::warn!("session ended, stopping");
        }
    }

    engine.shutdown().await;
    toast_logger.abort();
    Ok(())
}
