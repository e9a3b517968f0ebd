// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the taskbridge bot.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `TASKBRIDGE_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use taskbridge_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("webhook backend: {}", config.webhook.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TaskbridgeConfig;
pub use validation::{validate_config, validate_for_serve};

/// Load configuration and validate it.
///
/// With `path = None` the XDG hierarchy is used; otherwise only the given file
/// (plus environment overrides). Figment errors are converted into
/// diagnostics that point at the offending key.
pub fn load_and_validate(path: Option<&Path>) -> Result<TaskbridgeConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };

    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = collect_toml_sources(path);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TaskbridgeConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML file contents for error span resolution.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    match explicit {
        Some(path) => candidates.push(path.to_path_buf()),
        None => {
            candidates.push(
                std::env::current_dir()
                    .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
                    .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into()),
            );
            if let Some(config_dir) = dirs::config_dir() {
                candidates.push(config_dir.join("taskbridge/taskbridge.toml"));
            }
            candidates.push(loader::SYSTEM_CONFIG_PATH.into());
        }
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
