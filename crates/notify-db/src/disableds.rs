//! Disabled notification targets.
//!
//! The global switch is stored under its own scope, so no conversation ID can
//! alias it.

use crate::{Database, DbError};

const SCOPE_ALL: &str = "all";
const SCOPE_CONVERSATION: &str = "conversation";

/// A row of the disabled set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledTarget<'a> {
    /// Every conversation.
    All,
    Conversation(&'a str),
}

impl DisabledTarget<'_> {
    fn columns(&self) -> (&'static str, &str) {
        match self {
            Self::All => (SCOPE_ALL, ""),
            Self::Conversation(id) => (SCOPE_CONVERSATION, id),
        }
    }
}

impl Database {
    pub fn is_disabled(&self, target: DisabledTarget<'_>) -> Result<bool, DbError> {
        let (scope, key) = target.columns();
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM notification_disableds
                               WHERE scope = ?1 AND key = ?2 LIMIT 1)",
                [scope, key],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Add (`disabled = true`) or remove `target` from the disabled set.
    pub fn set_disabled(&self, target: DisabledTarget<'_>, disabled: bool) -> Result<(), DbError> {
        let (scope, key) = target.columns();
        self.with_conn(|conn| {
            if disabled {
                conn.execute(
                    "INSERT OR IGNORE INTO notification_disableds (scope, key, created_at)
                     VALUES (?1, ?2, CURRENT_TIMESTAMP)",
                    [scope, key],
                )?;
            } else {
                conn.execute(
                    "DELETE FROM notification_disableds WHERE scope = ?1 AND key = ?2",
                    [scope, key],
                )?;
            }
            Ok(())
        })
    }

    /// Conversation IDs with notifications turned off, sorted.
    pub fn disabled_conversations(&self) -> Result<Vec<String>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM notification_disableds WHERE scope = ?1 ORDER BY key",
            )?;
            let rows = stmt.query_map([SCOPE_CONVERSATION], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }
}
