/*
 * aursolve - Minimal AUR helper with recursive dependency resolution.
 * Copyright (C) 2026  aursolve contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Configuration with defaults, a user config file and env overrides.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::resolver::DependencyPolicy;

/// Main configuration structure for aursolve
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AUR RPC base URL
    pub rpc_url: String,

    /// Base URL the per-package git repositories hang off
    pub clone_url: String,

    /// Root directory holding one workspace per foreign package
    pub state_dir: PathBuf,

    /// Handling of dependencies found in neither the repos nor the AUR
    pub dependency_policy: DependencyPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://aur.archlinux.org/rpc/".to_string(),
            clone_url: "https://aur.archlinux.org".to_string(),
            state_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".aursolve"),
            dependency_policy: DependencyPolicy::Lenient,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then `~/.config/aursolve/config.toml`,
    /// then `AURSOLVE_*` environment overrides.
    ///
    /// Runs before the log subscriber exists, so problems are returned as
    /// warning strings for the caller to emit once logging is up.
    pub fn load() -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = Config::default();

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aursolve").join("config.toml");
            if user_config.exists() {
                match fs::read_to_string(&user_config)
                    .map_err(|e| e.to_string())
                    .and_then(|content| parse_user_config(&content))
                {
                    Ok(parsed) => config = parsed,
                    Err(e) => warnings.push(format!(
                        "ignoring unreadable config file {}: {e}",
                        user_config.display()
                    )),
                }
            }
        }

        let config = config.apply_env_overrides(&mut warnings);
        (config, warnings)
    }

    fn apply_env_overrides(mut self, warnings: &mut Vec<String>) -> Self {
        if let Ok(val) = std::env::var("AURSOLVE_RPC_URL") {
            self.rpc_url = val;
        }
        if let Ok(val) = std::env::var("AURSOLVE_CLONE_URL") {
            self.clone_url = val;
        }
        if let Ok(val) = std::env::var("AURSOLVE_STATE_DIR") {
            self.state_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("AURSOLVE_DEPENDENCY_POLICY") {
            match val.to_lowercase().as_str() {
                "strict" => self.dependency_policy = DependencyPolicy::Strict,
                "lenient" => self.dependency_policy = DependencyPolicy::Lenient,
                other => warnings.push(format!(
                    "unknown dependency policy {other:?}, keeping configured value"
                )),
            }
        }
        if let Ok(val) = std::env::var("AURSOLVE_LOG_LEVEL") {
            self.logging.level = val;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.rpc_url.starts_with("http") {
            return Err(format!("rpc_url does not look like a URL: {}", self.rpc_url));
        }
        if !self.clone_url.starts_with("http") {
            return Err(format!(
                "clone_url does not look like a URL: {}",
                self.clone_url
            ));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err("state_dir must not be empty".to_string());
        }
        Ok(())
    }
}

fn parse_user_config(content: &str) -> Result<Config, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}
