use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{DismissReason, Toast, ToastEvent};
use crate::models::Notification;

struct ActiveToast {
    toast: Toast,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct TrayInner {
    toasts: Vec<ActiveToast>,
    closed: bool,
}

/// The stack of visible toasts, newest last.
///
/// Every toast owns its own timer task; dismissing a toast early aborts that
/// task, so no timer outlives the toast it belongs to. Once closed the tray
/// accepts no new toasts.
#[derive(Clone)]
pub struct ToastTray {
    active: Arc<Mutex<TrayInner>>,
    duration: Duration,
    events: broadcast::Sender<ToastEvent>,
}

impl ToastTray {
    pub fn new(duration: Duration) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            active: Arc::new(Mutex::new(TrayInner::default())),
            duration,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    /// Shows a toast for `notification` and arms its auto-dismiss timer.
    /// Returns `None` once the tray is closed.
    pub async fn push(&self, notification: Notification) -> Option<Toast> {
        let mut active = self.active.lock().await;
        if active.closed {
            tracing::debug!(notification_id = notification.id, "tray closed, toast dropped");
            return None;
        }

        let toast = Toast::new(notification, self.duration);
        let toast_id = toast.toast_id;

        let tray = self.clone();
        let deadline = toast.shown_at + self.duration;
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tray.remove(toast_id, DismissReason::Expired).await;
        });

        active.toasts.push(ActiveToast {
            toast: toast.clone(),
            timer,
        });
        drop(active);

        tracing::debug!(
            toast_id = %toast_id,
            notification_id = toast.notification.id,
            "toast shown"
        );
        let _ = self.events.send(ToastEvent::Shown(toast.clone()));
        Some(toast)
    }

    /// Closes a toast before its timer fires.
    pub async fn dismiss(&self, toast_id: Uuid, reason: DismissReason) -> Option<Toast> {
        self.remove(toast_id, reason).await
    }

    /// Removes every toast, cancelling all pending timers. Returns how many were removed.
    pub async fn clear(&self, reason: DismissReason) -> usize {
        let drained: Vec<ActiveToast> = self.active.lock().await.toasts.drain(..).collect();
        self.dismiss_all(drained, reason)
    }

    /// Clears the tray and refuses every later `push`.
    pub async fn close(&self, reason: DismissReason) -> usize {
        let drained: Vec<ActiveToast> = {
            let mut active = self.active.lock().await;
            active.closed = true;
            active.toasts.drain(..).collect()
        };
        self.dismiss_all(drained, reason)
    }

    pub async fn is_closed(&self) -> bool {
        self.active.lock().await.closed
    }

    fn dismiss_all(&self, drained: Vec<ActiveToast>, reason: DismissReason) -> usize {
        let count = drained.len();

        for entry in drained {
            entry.timer.abort();
            self.emit_dismissed(&entry.toast, reason);
        }

        if count > 0 {
            tracing::debug!(count, ?reason, "toasts cleared");
        }
        count
    }

    pub async fn visible(&self) -> Vec<Toast> {
        self.active
            .lock()
            .await
            .toasts
            .iter()
            .map(|entry| entry.toast.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.active.lock().await.toasts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.active.lock().await.toasts.is_empty()
    }

    async fn remove(&self, toast_id: Uuid, reason: DismissReason) -> Option<Toast> {
        let entry = {
            let mut active = self.active.lock().await;
            let pos = active.toasts.iter().position(|e| e.toast.toast_id == toast_id)?;
            active.toasts.remove(pos)
        };

        // An expired toast is being removed by its own timer task.
        if reason != DismissReason::Expired {
            entry.timer.abort();
        }

        tracing::debug!(toast_id = %toast_id, ?reason, "toast dismissed");
        self.emit_dismissed(&entry.toast, reason);
        Some(entry.toast)
    }

    fn emit_dismissed(&self, toast: &Toast, reason: DismissReason) {
        let _ = self.events.send(ToastEvent::Dismissed {
            toast_id: toast.toast_id,
            notification_id: toast.notification.id,
            reason,
        });
    }
}
