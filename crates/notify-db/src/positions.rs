//! Per-conversation "last seen" positions.

use crate::{Database, DbError, OptionalExt};

impl Database {
    /// Stored position for a conversation, `None` if nothing was ever recorded.
    pub fn get_position(&self, conversation_id: &str) -> Result<Option<i64>, DbError> {
        self.with_conn(|conn| {
            let position = conn
                .query_row(
                    "SELECT position FROM notification_positions WHERE conversation_id = ?1",
                    [conversation_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(position)
        })
    }

    /// Overwrite the stored position.
    pub fn set_position(&self, conversation_id: &str, position: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notification_positions (conversation_id, position, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(conversation_id) DO UPDATE SET position = ?2, updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![conversation_id, position],
            )?;
            Ok(())
        })
    }

    /// Raise the stored position to `position` if it is higher, returning the
    /// value stored afterwards. Never lowers an existing position.
    pub fn advance_position(&self, conversation_id: &str, position: i64) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notification_positions (conversation_id, position, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     position = MAX(position, excluded.position),
                     updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![conversation_id, position],
            )?;
            let stored = conn.query_row(
                "SELECT position FROM notification_positions WHERE conversation_id = ?1",
                [conversation_id],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(stored)
        })
    }

    pub fn delete_position(&self, conversation_id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM notification_positions WHERE conversation_id = ?1",
                [conversation_id],
            )?;
            Ok(())
        })
    }
}
