//! Client-side notification sync for the Deskline admin app.
//!
//! [`NotificationEngine`] keeps the notification list and unread count in
//! step with the backend, polls for new notifications, and shows each one as
//! a toast at most once, even across restarts.

pub mod api;
pub mod config;
pub mod events;
pub mod models;
pub mod route_policy;
pub mod services;
pub mod state;
pub mod toast;

pub use api::{HttpNotificationApi, NotificationApi};
pub use config::AppConfig;
pub use events::{NotificationFeed, PollingFeed, PushFeed};
pub use models::{Notification, NotificationId, NotificationStats, NotificationStatus, NotificationType, Priority};
pub use route_policy::RoutePolicy;
pub use services::{EngineSettings, NotificationEngine, ShownToastRegistry};
pub use state::NotificationState;
pub use toast::{DismissReason, Toast, ToastEvent};
