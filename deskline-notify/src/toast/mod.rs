//! Transient toast popups for freshly arrived notifications.
//!
//! # Components
//!
//! - [`Toast`] - one popup instance wrapping a notification
//! - [`ToastTray`] - the visible stack, one auto-dismiss timer per toast
//! - [`format`] - display metadata and text helpers
//!
//! Views learn about toasts through [`ToastEvent`]s published on a broadcast
//! channel; the tray itself never renders anything.

pub mod format;
mod tray;

pub use tray::ToastTray;

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{Notification, NotificationId};

/// How long a toast stays up without user interaction.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Toast {
    pub toast_id: Uuid,
    pub notification: Notification,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(notification: Notification, duration: Duration) -> Self {
        Self {
            toast_id: Uuid::new_v4(),
            notification,
            shown_at: Instant::now(),
            duration,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration
            .saturating_sub(now.saturating_duration_since(self.shown_at))
    }

    /// Fraction of the countdown left, from 1.0 down to 0.0.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.remaining(now).as_secs_f32() / self.duration.as_secs_f32()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The countdown ran out.
    Expired,
    /// The user closed it.
    Closed,
    /// The user marked the notification read from the toast.
    MarkedRead,
    /// The active route does not allow toasts.
    Suppressed,
    /// The engine is shutting down.
    Teardown,
}

#[derive(Debug, Clone)]
pub enum ToastEvent {
    Shown(Toast),
    Dismissed {
        toast_id: Uuid,
        notification_id: NotificationId,
        reason: DismissReason,
    },
}
