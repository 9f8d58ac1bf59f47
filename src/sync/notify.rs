//! Match-start notification delivery.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::models::records::SportEvent;

/// Delivers a "match starting soon" notice to subscribed users.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Notifies `recipients` about `event`.
    ///
    /// Returns how many notifications were actually delivered.
    async fn dispatch(&self, event: &SportEvent, recipients: &[String]) -> Result<usize>;
}

/// Dispatcher used when no push service is configured.
///
/// Logs the candidates and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, event: &SportEvent, recipients: &[String]) -> Result<usize> {
        info!(
            event_id = %event.id,
            recipients = recipients.len(),
            "{} vs {} starting soon, no push service configured",
            event.home_team,
            event.away_team
        );
        Ok(0)
    }
}
