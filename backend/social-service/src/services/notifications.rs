//! Notification Ledger
//!
//! At most one notification exists per `(from, to, type, post)` tuple. Creation is
//! idempotent, and undoing an action (unlike, unfollow) removes the matching record.
use super::Stores;
use crate::domain::models::{Notification, NotificationKey, NotificationType};
use crate::domain::views::NotificationView;
use crate::error::{AppError, Result};
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationLedger {
    stores: Stores,
}

impl NotificationLedger {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Record a notification for `to`. Returns `None` when the actor is the recipient.
    pub async fn record(
        &self,
        from: Uuid,
        to: Uuid,
        kind: NotificationType,
        post: Option<Uuid>,
    ) -> Result<Option<Notification>> {
        if from == to {
            return Ok(None);
        }

        let candidate = Notification::new(NotificationKey {
            from,
            to,
            kind,
            post,
        });
        let stored = self
            .stores
            .call("notifications.create_if_absent", || {
                self.stores.notifications.create_if_absent(&candidate)
            })
            .await?;

        if stored.id == candidate.id {
            debug!(from = %from, to = %to, kind = %kind, "Notification recorded");
        }
        Ok(Some(stored))
    }

    /// Remove the notification for an undone action, if any
    pub async fn retract(&self, key: NotificationKey) -> Result<bool> {
        let removed = self
            .stores
            .call("notifications.delete_matching", || {
                self.stores.notifications.delete_matching(&key)
            })
            .await?;
        Ok(removed)
    }

    /// Side-effect variant used by the toggles: the primary action has already
    /// been committed, so a ledger failure is logged and not surfaced.
    pub(crate) async fn record_quietly(
        &self,
        from: Uuid,
        to: Uuid,
        kind: NotificationType,
        post: Option<Uuid>,
    ) {
        if let Err(e) = self.record(from, to, kind, post).await {
            error!(
                from = %from,
                to = %to,
                kind = %kind,
                error = %e,
                repair = "notification_missing",
                "Failed to record notification"
            );
        }
    }

    pub(crate) async fn retract_quietly(&self, key: NotificationKey) {
        if let Err(e) = self.retract(key).await {
            error!(
                from = %key.from,
                to = %key.to,
                kind = %key.kind,
                error = %e,
                repair = "notification_stale",
                "Failed to retract notification"
            );
        }
    }

    /// All notifications for the recipient, newest first. Views carry the read
    /// flags as they were before this call; the listed ones are marked read afterwards.
    pub async fn list_for_recipient(&self, to: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self
            .stores
            .call("notifications.list_for_recipient", || {
                self.stores.notifications.list_for_recipient(to)
            })
            .await?;

        let directory = self
            .stores
            .directory(notifications.iter().map(|n| n.from))
            .await?;
        let views = notifications
            .iter()
            .map(|n| NotificationView::render(n, &directory))
            .collect();

        let unread: Vec<Uuid> = notifications
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        if !unread.is_empty() {
            let flipped = self
                .stores
                .call("notifications.mark_read_many", || {
                    self.stores.notifications.mark_read_many(to, &unread)
                })
                .await?;
            debug!(to = %to, flipped, "Listed notifications marked read");
        }

        Ok(views)
    }

    pub async fn unread_count(&self, to: Uuid) -> Result<u64> {
        let count = self
            .stores
            .call("notifications.count_unread", || {
                self.stores.notifications.count_unread(to)
            })
            .await?;
        Ok(count)
    }

    pub async fn mark_all_read(&self, to: Uuid) -> Result<u64> {
        let updated = self
            .stores
            .call("notifications.mark_all_read", || {
                self.stores.notifications.mark_all_read(to)
            })
            .await?;
        debug!(recipient = %to, updated, "Notifications marked read");
        Ok(updated)
    }

    /// Mark one notification read; only its recipient may do so
    pub async fn mark_read(&self, id: Uuid, to: Uuid) -> Result<NotificationView> {
        let notification = self
            .stores
            .call("notifications.mark_read", || {
                self.stores.notifications.mark_read(id, to)
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

        let directory = self.stores.directory([notification.from]).await?;
        Ok(NotificationView::render(&notification, &directory))
    }

    pub async fn delete(&self, id: Uuid, to: Uuid) -> Result<()> {
        let removed = self
            .stores
            .call("notifications.delete", || {
                self.stores.notifications.delete(id, to)
            })
            .await?;
        if !removed {
            return Err(AppError::NotFound("Notification not found".into()));
        }
        Ok(())
    }

    pub async fn clear_all(&self, to: Uuid) -> Result<u64> {
        let removed = self
            .stores
            .call("notifications.delete_all", || {
                self.stores.notifications.delete_all(to)
            })
            .await?;
        info!(recipient = %to, removed, "Notifications cleared");
        Ok(removed)
    }
}
