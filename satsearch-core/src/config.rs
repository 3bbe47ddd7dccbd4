use serde::{Deserialize, Serialize};

/// Endpoint and download-layout configuration.
///
/// Constructed once and passed by reference into [`Query`](crate::Query)
/// and [`Search`](crate::Search); nothing in this crate reads ambient
/// process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the scene search API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Local directory downloaded assets are saved under.
    #[serde(default = "default_datadir")]
    pub datadir: String,

    /// Subdirectory pattern, substituted from scene metadata keys.
    #[serde(default = "default_subdirs")]
    pub subdirs: String,

    /// Filename pattern, substituted from scene metadata keys.
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Page size requested from the API.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    "https://api.developmentseed.org/satellites".to_string()
}

fn default_datadir() -> String {
    "./".to_string()
}

fn default_subdirs() -> String {
    "${satellite_name}/${date}".to_string()
}

fn default_filename() -> String {
    "${scene_id}".to_string()
}

fn default_limit() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            datadir: default_datadir(),
            subdirs: default_subdirs(),
            filename: default_filename(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.api_url, "https://api.developmentseed.org/satellites");
        assert_eq!(config.limit, 100);
        assert_eq!(config.filename, "${scene_id}");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: SearchConfig = toml::from_str("api_url = \"http://localhost:8000\"").unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.limit, 100);
        assert_eq!(config.subdirs, "${satellite_name}/${date}");
    }
}
