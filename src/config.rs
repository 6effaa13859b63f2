use std::time::Duration;
use url::Url;

pub const DEFAULT_CONNECT_URL: &str = "https://trashpack.tech/connect";
pub const DEFAULT_DETECTION_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_DETECTION_ATTEMPTS: u32 = 30;

/// Settings of the [`WalletAdapter`](crate::WalletAdapter).
///
/// Every field is optional when deserializing:
///
/// ```
/// # use trashpack_adapter::AdapterConfig;
/// let config: AdapterConfig = serde_json::from_str(r#"{ "maxDetectionAttempts": null }"#).unwrap();
/// assert_eq!(config.max_detection_attempts, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// page of the wallet that takes over the connection on mobile
    pub connect_url: Url,
    pub detection_interval_ms: u64,
    /// `None` keeps polling until the wallet shows up
    pub max_detection_attempts: Option<u32>,
}

impl AdapterConfig {
    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            connect_url: Url::parse(DEFAULT_CONNECT_URL)
                .unwrap_or_else(|error| unreachable!("invalid default connect url: {error}")),
            detection_interval_ms: DEFAULT_DETECTION_INTERVAL_MS,
            max_detection_attempts: Some(DEFAULT_MAX_DETECTION_ATTEMPTS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config: AdapterConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.connect_url.as_str(), DEFAULT_CONNECT_URL);
        assert_eq!(config.detection_interval(), Duration::from_secs(1));
        assert_eq!(config.max_detection_attempts, Some(30));
    }

    #[test]
    fn overrides() {
        let config: AdapterConfig = serde_json::from_value(json!({
            "connectUrl": "https://staging.trashpack.tech/connect",
            "detectionIntervalMs": 250,
            "maxDetectionAttempts": null,
        }))
        .unwrap();

        assert_eq!(config.connect_url.host_str(), Some("staging.trashpack.tech"));
        assert_eq!(config.detection_interval(), Duration::from_millis(250));
        assert_eq!(config.max_detection_attempts, None);
    }

    #[test]
    fn invalid_url() {
        assert!(
            serde_json::from_value::<AdapterConfig>(json!({ "connectUrl": "not a url" })).is_err()
        );
    }
}
