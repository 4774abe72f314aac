pub mod feed;
pub mod poller;

pub use feed::{NotificationFeed, PollingFeed, PushFeed};
