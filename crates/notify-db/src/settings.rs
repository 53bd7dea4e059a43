//! Daemon settings, each tagged with where its value came from.

use crate::{Database, DbError, OptionalExt};

/// Origin of a stored setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    /// Seeded from the built-in default.
    Default,
    /// Imported from the process environment.
    Env,
    /// Set explicitly by an operator.
    User,
}

impl SettingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Env => "env",
            Self::User => "user",
        }
    }

    fn parse(s: &str) -> Result<Self, DbError> {
        match s {
            "default" => Ok(Self::Default),
            "env" => Ok(Self::Env),
            "user" => Ok(Self::User),
            other => Err(DbError::InvalidData(format!("unknown setting source: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSetting {
    pub value: String,
    pub source: SettingSource,
}

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.get_stored_setting(key)?.map(|s| s.value))
    }

    pub fn get_stored_setting(&self, key: &str) -> Result<Option<StoredSetting>, DbError> {
        let row = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT value, source FROM settings WHERE key = ?1",
                    [key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            Ok(row)
        })?;
        let Some((value, source)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredSetting {
            value,
            source: SettingSource::parse(&source)?,
        }))
    }

    pub fn set_setting(&self, key: &str, value: &str, source: SettingSource) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value, source, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, source = ?3, updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![key, value, source.as_str()],
            )?;
            Ok(())
        })
    }

}
