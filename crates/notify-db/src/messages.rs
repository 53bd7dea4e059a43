//! Pending (unseen) message entries, stored as one JSON object per conversation.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, OptionalExt};

/// A pending message as persisted under its message ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub position: i64,
    pub text: String,
    /// Arrival order within the conversation.
    #[serde(default)]
    pub seq: u64,
}

pub type PendingMap = BTreeMap<String, StoredEntry>;

impl Database {
    pub fn get_pending(&self, conversation_id: &str) -> Result<PendingMap, DbError> {
        self.with_conn(|conn| read_pending(conn, conversation_id))
    }

    /// Replace the stored entries. An empty map removes the row.
    pub fn put_pending(&self, conversation_id: &str, entries: &PendingMap) -> Result<(), DbError> {
        self.with_conn(|conn| write_pending(conn, conversation_id, entries))
    }

    /// Insert `entry` under `message_id` unless that ID is already present.
    ///
    /// The read and the write happen inside one transaction. A caller-supplied
    /// `seq` is replaced with the next arrival number for the conversation.
    pub fn insert_pending_if_absent(
        &self,
        conversation_id: &str,
        message_id: &str,
        entry: &StoredEntry,
    ) -> Result<bool, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut entries = read_pending(&tx, conversation_id)?;
            if entries.contains_key(message_id) {
                return Ok(false);
            }
            let seq = entries.values().map(|e| e.seq + 1).max().unwrap_or(0);
            entries.insert(
                message_id.to_string(),
                StoredEntry {
                    seq,
                    ..entry.clone()
                },
            );
            write_pending(&tx, conversation_id, &entries)?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn remove_pending(&self, conversation_id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM notification_messages WHERE conversation_id = ?1",
                [conversation_id],
            )?;
            Ok(())
        })
    }
}

fn read_pending(conn: &Connection, conversation_id: &str) -> Result<PendingMap, DbError> {
    let json = conn
        .query_row(
            "SELECT messages_json FROM notification_messages WHERE conversation_id = ?1",
            [conversation_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| DbError::InvalidData(format!("pending messages for {conversation_id}: {e}"))),
        None => Ok(PendingMap::new()),
    }
}

fn write_pending(
    conn: &Connection,
    conversation_id: &str,
    entries: &PendingMap,
) -> Result<(), DbError> {
    if entries.is_empty() {
        conn.execute(
            "DELETE FROM notification_messages WHERE conversation_id = ?1",
            [conversation_id],
        )?;
        return Ok(());
    }
    let json = serde_json::to_string(entries)
        .map_err(|e| DbError::InvalidData(format!("invalid pending messages: {e}")))?;
    conn.execute(
        "INSERT INTO notification_messages (conversation_id, messages_json, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(conversation_id) DO UPDATE SET messages_json = ?2, updated_at = CURRENT_TIMESTAMP",
        rusqlite::params![conversation_id, json],
    )?;
    Ok(())
}
