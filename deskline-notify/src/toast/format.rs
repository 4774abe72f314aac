//! Display metadata and text helpers shared by every view of a notification.

use chrono::{DateTime, Utc};

use crate::models::{Notification, NotificationType, Priority};

/// Accent colours, named after the palette the admin UI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Blue,
    Green,
    Amber,
    Red,
    Purple,
    Orange,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMeta {
    pub icon: &'static str,
    pub label: &'static str,
    pub accent: Accent,
}

pub fn display_meta(kind: NotificationType) -> DisplayMeta {
    let (icon, label, accent) = match kind {
        NotificationType::TicketAssigned => ("🎫", "Ticket assigned", Accent::Blue),
        NotificationType::TaskAssigned => ("📋", "Task assigned", Accent::Green),
        NotificationType::StatusChanged => ("🔄", "Status changed", Accent::Amber),
        NotificationType::SystemAlert => ("⚠", "System alert", Accent::Red),
        NotificationType::Mention => ("💬", "Mention", Accent::Purple),
        NotificationType::DeadlineReminder => ("⏰", "Deadline reminder", Accent::Orange),
        NotificationType::Other => ("🔔", "Notification", Accent::Gray),
    };
    DisplayMeta { icon, label, accent }
}

pub fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Urgent => "Urgent",
    }
}

/// "just now", "5m ago", "3h ago", "2d ago", then a plain date after a week.
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);

    if elapsed.num_minutes() < 1 {
        return "just now".to_string();
    }
    if elapsed.num_hours() < 1 {
        return format!("{}m ago", elapsed.num_minutes());
    }
    if elapsed.num_days() < 1 {
        return format!("{}h ago", elapsed.num_hours());
    }
    if elapsed.num_days() < 7 {
        return format!("{}d ago", elapsed.num_days());
    }
    created_at.format("%Y-%m-%d").to_string()
}

/// Cuts `text` to at most `max_chars` characters, ending in `…` when shortened.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Single-line rendering used by the terminal watcher.
pub fn toast_line(notification: &Notification, now: DateTime<Utc>) -> String {
    let meta = display_meta(notification.notification_type);
    let mut line = format!("{} {}: {}", meta.icon, meta.label, notification.title);

    if !notification.message.is_empty() {
        line.push_str(" - ");
        line.push_str(&truncate(&notification.message, 80));
    }
    if notification.priority >= Priority::High {
        line.push_str(&format!(" [{}]", priority_label(notification.priority)));
    }
    if let Some(sender) = &notification.sender_name {
        line.push_str(&format!(" (from {sender})"));
    }
    line.push_str(&format!(" · {}", relative_time(notification.created_at, now)));
    line
}
