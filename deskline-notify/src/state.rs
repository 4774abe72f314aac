use crate::models::{Notification, NotificationId};

/// Everything a view needs to render the notification center.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl NotificationState {
    /// Derives `unread_count` from the list. Called after every local mutation.
    pub fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| n.is_unread()).count() as u64;
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.notifications.iter_mut().find(|n| n.id == id)
    }

    /// Prepends `notification` unless its id is already listed.
    pub fn merge_new(&mut self, notification: Notification) -> bool {
        if self.contains(notification.id) {
            return false;
        }
        self.notifications.insert(0, notification);
        self.recount();
        true
    }

    pub fn remove(&mut self, id: NotificationId) -> Option<Notification> {
        let pos = self.notifications.iter().position(|n| n.id == id)?;
        let removed = self.notifications.remove(pos);
        self.recount();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(id: NotificationId, status: &str) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "status": status,
            "created_at": Utc::now(),
        }))
        .unwrap()
    }

    #[test]
    fn merge_is_idempotent() {
        let mut state = NotificationState::default();
        assert!(state.merge_new(notification(1, "unread")));
        assert!(!state.merge_new(notification(1, "unread")));
        assert_eq!(state.notifications.len(), 1);
        assert_eq!(state.unread_count, 1);
    }

    #[test]
    fn merge_prepends() {
        let mut state = NotificationState {
            notifications: vec![notification(1, "read")],
            ..Default::default()
        };
        state.merge_new(notification(2, "unread"));
        assert_eq!(state.notifications[0].id, 2);
        assert_eq!(state.unread_count, 1);
    }

    #[test]
    fn remove_recounts() {
        let mut state = NotificationState {
            notifications: vec![notification(1, "unread"), notification(2, "unread")],
            unread_count: 2,
            ..Default::default()
        };
        assert!(state.remove(1).is_some());
        assert!(state.remove(1).is_none());
        assert_eq!(state.unread_count, 1);
    }
}
