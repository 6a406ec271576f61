//! TOML configuration parsing.
//!
//! Configuration is read once at startup and passed explicitly to every
//! backend and flow constructor. The backend base URL may be overridden from
//! the environment (`ROOMS_BACKEND_URL`) through the CLI.

use anyhow::{bail, Context, Result};
use roomdesk_core::models::DEFAULT_PAGE_SIZE;
use roomdesk_core::sanitize::{
    ScaffoldFilter, DEFAULT_SCAFFOLD_PREFIXES, DEFAULT_SCAFFOLD_SUBSTRINGS,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendConfig {
    #[serde(default)]
    pub base_url: String,
    /// Per-request timeout. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SubmitConfig {
    /// Send the mirrored form metadata instead of an empty object.
    #[serde(default)]
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_scaffold_prefixes")]
    pub scaffold_prefixes: Vec<String>,
    #[serde(default = "default_scaffold_substrings")]
    pub scaffold_substrings: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            scaffold_prefixes: default_scaffold_prefixes(),
            scaffold_substrings: default_scaffold_substrings(),
        }
    }
}

fn default_scaffold_prefixes() -> Vec<String> {
    DEFAULT_SCAFFOLD_PREFIXES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_scaffold_substrings() -> Vec<String> {
    DEFAULT_SCAFFOLD_SUBSTRINGS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl ChatConfig {
    pub fn filter(&self) -> ScaffoldFilter {
        ScaffoldFilter {
            prefixes: self.scaffold_prefixes.clone(),
            substrings: self.scaffold_substrings.clone(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Config {
    /// Defaults for everything; the base URL must still be supplied.
    pub fn minimal() -> Self {
        Self {
            backend: BackendConfig::default(),
            feed: FeedConfig::default(),
            submit: SubmitConfig::default(),
            chat: ChatConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.backend.base_url.trim();
        if base.is_empty() {
            bail!("backend.base_url must be set (or pass --backend-url / ROOMS_BACKEND_URL)");
        }
        let url = reqwest::Url::parse(base)
            .with_context(|| format!("backend.base_url is not a valid URL: '{}'", base))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "backend.base_url must use http or https, got '{}'",
                url.scheme()
            );
        }

        if self.backend.timeout_secs == Some(0) {
            bail!("backend.timeout_secs must be > 0 when set");
        }

        if self.feed.page_size == 0 {
            bail!("feed.page_size must be > 0");
        }

        Ok(())
    }
}

/// Reads and parses `path` without validating; see [`Config::validate`].
pub fn parse_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    Ok(config)
}

/// Reads, parses and validates the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = parse_config(path)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise starts from [`Config::minimal`].
/// `backend_url` (from the CLI or environment) wins over the file. The
/// result is validated.
pub fn resolve_config(path: &Path, backend_url: Option<&str>) -> Result<Config> {
    let mut config = if path.exists() {
        parse_config(path)?
    } else {
        Config::minimal()
    };
    if let Some(url) = backend_url {
        config.backend.base_url = url.to_string();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"
[backend]
base_url = "http://localhost:8000/"
timeout_secs = 30

[feed]
page_size = 25

[submit]
include_metadata = true

[chat]
scaffold_prefixes = ["starter/"]
scaffold_substrings = []
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.backend.base(), "http://localhost:8000");
        assert_eq!(config.backend.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.feed.page_size, 25);
        assert!(config.submit.include_metadata);
        assert_eq!(config.chat.filter().prefixes, vec!["starter/".to_string()]);
        assert!(config.chat.filter().substrings.is_empty());
    }

    #[test]
    fn test_defaults() {
        let file = write_config("[backend]\nbase_url = \"https://rooms.example.com\"\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.feed.page_size, 10);
        assert!(!config.submit.include_metadata);
        assert!(config.backend.timeout().is_none());
        assert_eq!(config.chat.filter(), ScaffoldFilter::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            ("[backend]\nbase_url = \"\"\n", "base_url must be set"),
            ("[backend]\nbase_url = \"not a url\"\n", "not a valid URL"),
            ("[backend]\nbase_url = \"ftp://x\"\n", "http or https"),
            (
                "[backend]\nbase_url = \"http://x\"\ntimeout_secs = 0\n",
                "timeout_secs",
            ),
            (
                "[backend]\nbase_url = \"http://x\"\n[feed]\npage_size = 0\n",
                "page_size",
            ),
        ];
        for (content, expected) in cases {
            let file = write_config(content);
            let err = load_config(file.path()).unwrap_err();
            assert!(
                format!("{:#}", err).contains(expected),
                "expected '{}' in error, got: {:#}",
                expected,
                err
            );
        }
    }

    #[test]
    fn test_resolve_missing_file_uses_override() {
        let config = resolve_config(
            Path::new("/nonexistent/rooms.toml"),
            Some("http://127.0.0.1:9000"),
        )
        .unwrap();
        assert_eq!(config.backend.base(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_resolve_missing_file_without_url_fails() {
        assert!(resolve_config(Path::new("/nonexistent/rooms.toml"), None).is_err());
    }

    #[test]
    fn test_override_beats_file() {
        let file = write_config("[backend]\nbase_url = \"http://from-file:1\"\n");
        let config = resolve_config(file.path(), Some("http://from-env:2")).unwrap();
        assert_eq!(config.backend.base(), "http://from-env:2");
    }
}
