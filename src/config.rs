use crate::error::{ObservableError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// When the set of listeners for a notification is decided.
///
/// Listeners are always captured when the change is scheduled, so a listener
/// registered afterwards never sees an earlier change. The policy only decides
/// whether an unsubscribe that lands between scheduling and delivery still
/// suppresses that delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotPolicy {
    /// Deliver to every listener captured at schedule time.
    #[default]
    Schedule,
    /// Skip captured listeners that were unsubscribed before delivery.
    Delivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservableConfig {
    pub snapshot_policy: SnapshotPolicy,
    /// Log panics raised by listeners on the delivery task.
    pub log_listener_panics: bool,
}

impl Default for ObservableConfig {
    fn default() -> Self {
        Self {
            snapshot_policy: SnapshotPolicy::Schedule,
            log_listener_panics: true,
        }
    }
}

impl ObservableConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(policy) = lookup("OBSERVABLE_SNAPSHOT_POLICY")
            && let Ok(p) = policy.trim().parse()
        {
            config.snapshot_policy = p;
        }
        if let Some(log_panics) = lookup("OBSERVABLE_LOG_LISTENER_PANICS")
            && let Ok(b) = log_panics.trim().parse()
        {
            config.log_listener_panics = b;
        }

        config
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }
}

impl SnapshotPolicy {
    /// Strict parse for user-facing input (CLI flags).
    pub fn parse_strict(value: &str) -> Result<Self> {
        Self::from_str(value.trim())
            .map_err(|_| ObservableError::InvalidConfig(format!("unknown snapshot policy '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ObservableConfig::from_lookup(|_| None);
        assert_eq!(config.snapshot_policy, SnapshotPolicy::Schedule);
        assert!(config.log_listener_panics);
    }

    #[test]
    fn test_overrides_from_variables() {
        let config = ObservableConfig::from_lookup(lookup_from(&[
            ("OBSERVABLE_SNAPSHOT_POLICY", "Delivery"),
            ("OBSERVABLE_LOG_LISTENER_PANICS", "false"),
        ]));
        assert_eq!(config.snapshot_policy, SnapshotPolicy::Delivery);
        assert!(!config.log_listener_panics);
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let config = ObservableConfig::from_lookup(lookup_from(&[
            ("OBSERVABLE_SNAPSHOT_POLICY", "eventually"),
            ("OBSERVABLE_LOG_LISTENER_PANICS", "maybe"),
        ]));
        assert_eq!(config.snapshot_policy, SnapshotPolicy::Schedule);
        assert!(config.log_listener_panics);
    }

    #[test]
    fn test_policy_display_and_strict_parse() {
        assert_eq!(SnapshotPolicy::Delivery.to_string(), "delivery");
        assert_eq!(
            SnapshotPolicy::parse_strict(" schedule ").unwrap(),
            SnapshotPolicy::Schedule
        );
        assert!(matches!(
            SnapshotPolicy::parse_strict("never"),
            Err(ObservableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_serde_uses_lowercase_policy() {
        let config = ObservableConfig::default().with_snapshot_policy(SnapshotPolicy::Delivery);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["snapshot_policy"], "delivery");
        let back: ObservableConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.snapshot_policy, SnapshotPolicy::Delivery);
    }
}
