use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::is_http_url;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_API_VERSION: &str = "v1alpha";
const DEFAULT_PREVIEW_FILE: &str = "sketch-preview.html";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub api_version: String,
    pub preview_path: PathBuf,
    pub runner: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let Some(api_key) =
            non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("VITE_GEMINI_API_KEY"))
        else {
            bail!("GEMINI_API_KEY is not configured");
        };
        let model = non_empty_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url =
            non_empty_env("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_version =
            non_empty_env("GEMINI_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let preview_path = match non_empty_env("SKETCH_PREVIEW_PATH") {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir()?.join(DEFAULT_PREVIEW_FILE),
        };

        Ok(Self {
            api_key,
            model,
            api_url,
            api_version,
            preview_path,
            runner: non_empty_env("SKETCH_RUNNER"),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("GEMINI_API_KEY is not configured");
        }

        if !is_http_url(&self.api_url) {
            bail!(
                "Invalid GEMINI_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.model.trim().is_empty() || self.model.contains('/') {
            bail!("Invalid model name: '{}'", self.model);
        }

        if self.api_version.trim().is_empty() {
            bail!("GEMINI_API_VERSION must not be empty");
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        if v.trim().is_empty() {
            None
        } else {
            Some(v.trim().to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for name in [
            "GEMINI_API_KEY",
            "VITE_GEMINI_API_KEY",
            "GEMINI_MODEL",
            "GEMINI_API_URL",
            "GEMINI_API_VERSION",
            "SKETCH_PREVIEW_PATH",
            "SKETCH_RUNNER",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_load_fails_without_api_key() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        let err = Config::load().expect_err("missing key must be fatal");
        assert_eq!(err.to_string(), "GEMINI_API_KEY is not configured");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "   ");
        assert!(Config::load().is_err());
        clear_env();
    }

    #[test]
    fn test_load_uses_defaults_and_vite_fallback() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var("VITE_GEMINI_API_KEY", "vite-key");
        let config = Config::load().expect("config should load");
        assert_eq!(config.api_key, "vite-key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(config.preview_path.ends_with(DEFAULT_PREVIEW_FILE));
        assert!(config.runner.is_none());
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    fn test_load_reads_overrides() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "key");
        std::env::set_var("GEMINI_MODEL", "gemini-2.5-pro");
        std::env::set_var("SKETCH_PREVIEW_PATH", "/tmp/preview.html");
        std::env::set_var("SKETCH_RUNNER", "sketch-host --headless");
        let config = Config::load().expect("config should load");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.preview_path, PathBuf::from("/tmp/preview.html"));
        assert_eq!(config.runner.as_deref(), Some("sketch-host --headless"));
        clear_env();
    }
}
