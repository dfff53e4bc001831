use vitrine_shared::models::Notification;
use vitrine_shared::types::NotificationId;

use crate::error::Result;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        self.get("/notifications").await
    }

    pub async fn mark_notification_read(&self, notification: &NotificationId) -> Result<()> {
        self.put_discard(&format!("/notifications/{notification}/read"))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<()> {
        self.put_discard("/notifications/read-all").await
    }
}
