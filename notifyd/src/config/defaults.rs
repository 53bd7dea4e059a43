//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    (
        "APPLICATION_ID",
        "com.layer.messenger",
        "Application ID; the swipe-away action is <APPLICATION_ID>.CANCEL_PUSH",
    ),
    (
        "MAX_NOTIFICATION_LINES",
        "5",
        "Expanded lines shown per conversation before the rest are summarized",
    ),
    (
        "SUPPRESSED_POLICY",
        "drop",
        "Messages arriving while notifications are disabled: 'drop' or 'record'",
    ),
    (
        "NEW_MESSAGES_TEMPLATE",
        "{count} new messages",
        "Collapsed text for more than one message",
    ),
    (
        "MORE_MESSAGES_TEMPLATE",
        "+{count} more",
        "Summary line for messages beyond the line limit",
    ),
    (
        "NOTIFICATION_OUTPUT",
        "stdout",
        "Where rendered notifications go: 'stdout' (JSON lines) or 'log'",
    ),
    (
        "LOG_ALWAYS",
        "false",
        "Always log the notification path at trace level",
    ),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
