use std::collections::HashSet;

use deskline_shared::clients::storage::{LocalStore, SHOWN_TOASTS_KEY};
use deskline_shared::{AppError, AppResult};

use crate::models::NotificationId;

/// Ids of notifications that were already surfaced as a toast.
///
/// Persisted under `shownToastIds` as a JSON array so a reload never toasts
/// the same notification twice. The set only grows.
pub struct ShownToastRegistry {
    store: LocalStore,
    ids: HashSet<NotificationId>,
}

impl ShownToastRegistry {
    /// Reads the persisted set. A missing file is an empty set; an unreadable
    /// one is logged and treated as empty.
    pub fn load(store: LocalStore) -> Self {
        let ids = match store.get::<Vec<NotificationId>>(SHOWN_TOASTS_KEY) {
            Ok(Some(ids)) => ids.into_iter().collect(),
            Ok(None) => HashSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "shown toast registry unreadable, starting empty");
                HashSet::new()
            }
        };

        tracing::debug!(count = ids.len(), "shown toast registry loaded");
        Self { store, ids }
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records `id` in memory. Returns `false` if it was already known.
    pub fn insert(&mut self, id: NotificationId) -> bool {
        self.ids.insert(id)
    }

    /// The current set, sorted, paired with the store it belongs in. Taken
    /// under the caller's lock and written with [`write_snapshot`] after the
    /// lock is released.
    pub fn snapshot(&self) -> (LocalStore, Vec<NotificationId>) {
        let mut ids: Vec<NotificationId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        (self.store.clone(), ids)
    }
}

/// Writes a registry snapshot on the blocking pool.
pub async fn write_snapshot(store: LocalStore, ids: Vec<NotificationId>) -> AppResult<()> {
    tokio::task::spawn_blocking(move || store.set(SHOWN_TOASTS_KEY, &ids))
        .await
        .map_err(|e| AppError::internal(format!("registry write task failed: {e}")))?
}
