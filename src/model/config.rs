use serde::{Deserialize, Serialize};

/// Configuration from `.checklist/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sources: Vec<ListSource>,
}

/// Settings for the task suggestion service. The checklist engine only
/// stores these; nothing in it talks to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            service: default_service(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl Settings {
    /// An empty string counts as "no key"
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn default_service() -> String {
    "google".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Set once the intro hint has been printed
    #[serde(default)]
    pub has_seen_intro: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// A predefined task list reachable by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSource {
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.settings.service, "google");
        assert!(!config.settings.has_api_key());
        assert!(!config.ui.has_seen_intro);
        assert_eq!(config.remote.timeout_secs, 10);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn parses_sources_and_settings() {
        let config: Config = toml::from_str(
            r#"
[settings]
api_key = "secret"

[[sources]]
name = "Example"
url = "https://example.com/list.json"
"#,
        )
        .unwrap();
        assert!(config.settings.has_api_key());
        assert_eq!(config.settings.model, "gemini-1.5-flash");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "Example");
    }

    #[test]
    fn blank_api_key_is_absent() {
        let config: Config = toml::from_str("[settings]\napi_key = \"\"\n").unwrap();
        assert!(!config.settings.has_api_key());
    }
}
