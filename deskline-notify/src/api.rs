use async_trait::async_trait;
use deskline_shared::clients::ApiClient;
use deskline_shared::AppResult;

use crate::models::{CheckNewResponse, Notification, NotificationId, NotificationStats, UnreadCountResponse};

/// The notification endpoints of the backend.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// GET /notifications/
    async fn list(&self) -> AppResult<Vec<Notification>>;
    /// GET /notifications/unread-count
    async fn unread_count(&self) -> AppResult<u64>;
    /// GET /notifications/check-new
    async fn check_new(&self) -> AppResult<bool>;
    /// GET /notifications/latest
    async fn latest(&self) -> AppResult<Option<Notification>>;
    /// PATCH /notifications/{id}/read
    async fn mark_read(&self, id: NotificationId) -> AppResult<()>;
    /// PATCH /notifications/mark-all-read
    async fn mark_all_read(&self) -> AppResult<()>;
    /// DELETE /notifications/{id}
    async fn delete(&self, id: NotificationId) -> AppResult<()>;
    /// GET /notifications/stats
    async fn stats(&self) -> AppResult<NotificationStats>;
}

pub struct HttpNotificationApi {
    client: ApiClient,
}

impl HttpNotificationApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self) -> AppResult<Vec<Notification>> {
        self.client.get("/notifications/").await
    }

    async fn unread_count(&self) -> AppResult<u64> {
        let response: UnreadCountResponse = self.client.get("/notifications/unread-count").await?;
        Ok(response.count())
    }

    async fn check_new(&self) -> AppResult<bool> {
        let response: CheckNewResponse = self.client.get("/notifications/check-new").await?;
        Ok(response.has_new())
    }

    async fn latest(&self) -> AppResult<Option<Notification>> {
        self.client.get_optional("/notifications/latest").await
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        self.client.patch(&format!("/notifications/{id}/read")).await
    }

    async fn mark_all_read(&self) -> AppResult<()> {
        self.client.patch("/notifications/mark-all-read").await
    }

    async fn delete(&self, id: NotificationId) -> AppResult<()> {
        self.client.delete(&format!("/notifications/{id}")).await
    }

    async fn stats(&self) -> AppResult<NotificationStats> {
        self.client.get("/notifications/stats").await
    }
}
