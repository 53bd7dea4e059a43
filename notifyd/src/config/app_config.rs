//! Runtime application configuration loaded from DB + environment overrides.

use notify_core::{AggregatorConfig, SummaryStrings, SuppressedPolicy};

use super::defaults::get_default;
use super::manager::SettingsManager;

/// Where rendered notifications are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON object per line on stdout.
    Stdout,
    /// Only as structured log events.
    Log,
}

impl OutputMode {
    pub fn from_str_setting(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "log" => Self::Log,
            _ => Self::Stdout,
        }
    }
}

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub application_id: String,
    pub max_lines: usize,
    pub suppressed_policy: SuppressedPolicy,
    pub new_messages_template: String,
    pub more_messages_template: String,
    pub output: OutputMode,
    pub log_always: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            application_id: "com.layer.messenger".into(),
            max_lines: notify_core::aggregator::DEFAULT_MAX_LINES,
            suppressed_policy: SuppressedPolicy::Drop,
            new_messages_template: "{count} new messages".into(),
            more_messages_template: "+{count} more".into(),
            output: OutputMode::Stdout,
            log_always: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager (DB-first, env overrides).
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String {
            sm.get_setting(key)
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| get_default(key).map(str::to_string))
                .unwrap_or_default()
        };

        let mut output = OutputMode::from_str_setting(&g("NOTIFICATION_OUTPUT"));
        if let Ok(v) = std::env::var("NOTIFICATION_OUTPUT") {
            output = OutputMode::from_str_setting(&v);
        }

        // LOG_ALWAYS can also be overridden by env
        let log_always = std::env::var("LOG_ALWAYS")
            .map(|v| v == "true")
            .unwrap_or_else(|_| g("LOG_ALWAYS") == "true");

        Ok(Self {
            application_id: g("APPLICATION_ID"),
            max_lines: parse_usize(&g("MAX_NOTIFICATION_LINES"), notify_core::aggregator::DEFAULT_MAX_LINES),
            suppressed_policy: SuppressedPolicy::from_str_setting(&g("SUPPRESSED_POLICY")),
            new_messages_template: g("NEW_MESSAGES_TEMPLATE"),
            more_messages_template: g("MORE_MESSAGES_TEMPLATE"),
            output,
            log_always,
        })
    }

    /// Intent action sent when the user swipes a notification away.
    pub fn cancel_action(&self) -> String {
        format!("{}.CANCEL_PUSH", self.application_id)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            max_lines: self.max_lines,
            suppressed: self.suppressed_policy,
            strings: SummaryStrings {
                new_messages: self.new_messages_template.clone(),
                more_messages: self.more_messages_template.clone(),
            },
        }
    }
}

fn parse_usize(s: &str, default: usize) -> usize {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
