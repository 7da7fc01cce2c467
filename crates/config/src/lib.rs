#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for wbx
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Project configuration file (`<project>/wbx.toml`)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod paths;
pub mod sections;

pub use paths::ProjectPaths;
pub use sections::{
    CompressionConfig, DependenciesConfig, DocumentConfig, ManifestConfig, ProjectConfig,
    RetryConfig, RuntimeConfig, ToolchainConfig, ToolsConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use wbx_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub document: DocumentConfig,
}

impl Config {
    /// Config file location inside a project
    #[must_use]
    pub fn project_path(project_root: &Path) -> PathBuf {
        project_root.join(constants::CONFIG_FILE)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load the project's `wbx.toml`, falling back to defaults when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load(project_root: &Path) -> Result<Self, Error> {
        let config_path = Self::project_path(project_root);

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path or from the project root
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>, project_root: &Path) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load(project_root).await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an empty value.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // WBX_TOOLCHAIN
        if let Some(compiler) = lookup("WBX_TOOLCHAIN") {
            self.toolchain.compiler = non_empty("WBX_TOOLCHAIN", compiler)?;
        }

        // WBX_BUNDLER
        if let Some(bundler) = lookup("WBX_BUNDLER") {
            self.tools.bundler = non_empty("WBX_BUNDLER", bundler)?;
        }

        Ok(())
    }

    /// Check values that serde cannot reject on its own
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.project.app_target.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project.app_target".to_string(),
            }
            .into());
        }
        if self.project.index_file.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "project.index_file".to_string(),
            }
            .into());
        }
        if !(1..=9).contains(&self.compression.gzip_level) {
            return Err(ConfigError::InvalidValue {
                field: "compression.gzip_level".to_string(),
                value: self.compression.gzip_level.to_string(),
            }
            .into());
        }
        if self.compression.brotli_level > 11 {
            return Err(ConfigError::InvalidValue {
                field: "compression.brotli_level".to_string(),
                value: self.compression.brotli_level.to_string(),
            }
            .into());
        }
        if self.manifest.command.is_empty() {
            return Err(ConfigError::MissingField {
                field: "manifest.command".to_string(),
            }
            .into());
        }
        if !self.document.managed_attribute.contains('=') {
            return Err(ConfigError::InvalidValue {
                field: "document.managed_attribute".to_string(),
                value: self.document.managed_attribute.clone(),
            }
            .into());
        }
        if let Some(splash) = &self.document.spec.splash {
            if splash.path.is_some() == splash.body.is_some() {
                return Err(ConfigError::Invalid {
                    message: "document.splash needs exactly one of `path` or `body`".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Absolute project locations for a project root
    #[must_use]
    pub fn paths(&self, project_root: &Path) -> ProjectPaths {
        ProjectPaths::new(project_root, &self.project)
    }
}

fn non_empty(field: &str, value: String) -> Result<String, Error> {
    if value.trim().is_empty() {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wbx_types::AttrValue;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.project.app_target, "App");
        assert_eq!(config.tools.bundler, "webpack-cli");
        assert!(config.retry.is_flaky("runtime-build"));
        config.validate().unwrap();
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            Config::project_path(dir.path()),
            r#"
[project]
app_target = "Shop"

[compression]
debug = true

[document]
title = "Shop"
scripts = [{ src = "/vendor.js", defer = true }]
"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.project.app_target, "Shop");
        assert_eq!(config.project.web_sources, PathBuf::from("WebSources"));
        assert!(config.compression.debug);
        assert_eq!(config.compression.gzip_level, 2);
        assert_eq!(config.document.spec.title, "Shop");
        assert_eq!(config.document.spec.lang, "en-US");
        assert_eq!(config.document.managed_attribute, r#"managed-by="wbx""#);
        assert_eq!(
            config.document.spec.scripts[0]["defer"],
            AttrValue::Flag(true)
        );
    }

    #[tokio::test]
    async fn invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[project\napp_target = ").unwrap();
        let err = Config::load_or_default(Some(&path), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn explicit_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::load_or_default(Some(&path), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = Config::default();
        config
            .merge_env_from(|key| match key {
                "WBX_TOOLCHAIN" => Some("/opt/toolchains/6.1/usr/bin/swift".to_string()),
                "WBX_BUNDLER" => Some("rspack".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.toolchain.compiler, "/opt/toolchains/6.1/usr/bin/swift");
        assert_eq!(config.tools.bundler, "rspack");

        let err = config
            .merge_env_from(|key| (key == "WBX_BUNDLER").then(String::new))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.compression.gzip_level = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.document.spec.splash = Some(wbx_types::SplashSpec::default());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.project.app_target = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
