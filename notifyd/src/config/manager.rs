//! SettingsManager: DB-backed settings with defaults and env migration.

use notify_db::{Database, SettingSource};

use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;

/// Wraps [`Database`] to provide high-level settings operations.
pub struct SettingsManager {
    db: Database,
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }
        validate_setting(key, value).map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;
        self.db.set_setting(key, value, SettingSource::User)?;
        Ok(())
    }

    /// Seed missing settings with their defaults. Values seeded by an older
    /// build follow the current default; env and user values are kept.
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for (key, def) in DEFAULT_SETTINGS.iter() {
            match self.db.get_stored_setting(key)? {
                None => {}
                Some(stored)
                    if stored.source == SettingSource::Default && stored.value != def.default =>
                {
                    tracing::info!("Updating default for {key}");
                }
                Some(_) => continue,
            }
            self.db.set_setting(key, def.default, SettingSource::Default)?;
        }
        Ok(())
    }

    /// Copy settings present in the environment into the DB. Only missing keys
    /// and seeded defaults are replaced. Invalid values are logged and skipped.
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            let stored = self.db.get_stored_setting(key)?;
            if stored.is_some_and(|s| s.source != SettingSource::Default) {
                continue;
            }
            let Ok(env_val) = std::env::var(key) else {
                continue;
            };
            if env_val.is_empty() {
                continue;
            }
            if let Err(e) = validate_setting(key, &env_val) {
                tracing::warn!("Ignoring invalid {key} from env: {e}");
                continue;
            }
            self.db.set_setting(key, &env_val, SettingSource::Env)?;
            tracing::info!("Migrated setting from env: {key}");
            migrated += 1;
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
        }
        Ok(migrated)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (SettingsManager, Database) {
        let db = Database::open_in_memory().expect("Failed to create test DB");
        (SettingsManager::new(db.clone()), db)
    }

    #[test]
    fn test_defaults_and_overrides() {
        let (sm, db) = manager();
        assert_eq!(sm.get_setting("MAX_NOTIFICATION_LINES").unwrap(), "5");

        sm.set_setting("MAX_NOTIFICATION_LINES", "3").unwrap();
        assert_eq!(sm.get_setting("MAX_NOTIFICATION_LINES").unwrap(), "3");
        let stored = db.get_stored_setting("MAX_NOTIFICATION_LINES").unwrap().unwrap();
        assert_eq!(stored.source, SettingSource::User);
    }

    #[test]
    fn test_rejects_unknown_and_invalid() {
        let (sm, _db) = manager();
        assert!(sm.set_setting("NOPE", "1").is_err());
        assert!(sm.set_setting("MAX_NOTIFICATION_LINES", "100").is_err());
        assert!(sm.get_setting("NOPE").is_err());
    }

    #[test]
    fn test_initialize_defaults_keeps_existing() {
        let (sm, db) = manager();
        sm.set_setting("SUPPRESSED_POLICY", "record").unwrap();
        sm.initialize_defaults().unwrap();
        assert_eq!(db.get_setting("SUPPRESSED_POLICY").unwrap(), Some("record".into()));
        assert_eq!(db.get_setting("LOG_ALWAYS").unwrap(), Some("false".into()));
    }

    #[test]
    fn test_initialize_defaults_refreshes_stale_seeded_values() {
        let (sm, db) = manager();
        db.set_setting("MORE_MESSAGES_TEMPLATE", "and {count} others", SettingSource::Default)
            .unwrap();
        db.set_setting("NEW_MESSAGES_TEMPLATE", "{count} unread", SettingSource::Env)
            .unwrap();
        sm.initialize_defaults().unwrap();

        assert_eq!(sm.get_setting("MORE_MESSAGES_TEMPLATE").unwrap(), "+{count} more");
        assert_eq!(sm.get_setting("NEW_MESSAGES_TEMPLATE").unwrap(), "{count} unread");
    }
}
