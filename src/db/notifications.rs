//! User subscriptions to match-start notifications.

use rusqlite::params;

use super::Database;
use crate::error::Result;

impl Database {
    /// Subscribes (or re-subscribes) a user to an event.
    pub fn subscribe(&self, user_id: &str, event_id: &str, notify_on_start: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_sport_notifications (user_id, event_id, notify_on_start)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, event_id) DO UPDATE SET
                     notify_on_start = excluded.notify_on_start",
                params![user_id, event_id, notify_on_start],
            )
        })?;
        Ok(())
    }

    /// Users who asked to be told when `event_id` starts.
    pub fn notification_recipients(&self, event_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id FROM user_sport_notifications
                 WHERE event_id = ?1 AND notify_on_start = 1
                 ORDER BY user_id",
            )?;
            let users = stmt
                .query_map(params![event_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(users)
        })
    }
}
