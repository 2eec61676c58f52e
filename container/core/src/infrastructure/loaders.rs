// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0
//! Reference Configuration Loaders
//!
//! Loaders turn a configuration reference into a [`ScopeConfig`] during
//! resolution. Two implementations ship with the container:
//!
//! - **File**: reads the `file` parameter and parses the referenced file as
//!   YAML or JSON, selected by extension
//! - **Inline**: parses the `config` parameter as inline JSON
//!
//! Deployments register additional loaders through the container builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::domain::config::ScopeConfig;
use crate::domain::loader::{ConfigLoader, LoaderError};

/// Type identifier the file loader is registered under by default.
pub const FILE_LOADER: &str = "file";

/// Type identifier the inline loader is registered under by default.
pub const INLINE_LOADER: &str = "inline";

/// Parameter naming the file a configuration is loaded from.
pub const FILE_PARAM: &str = "file";

/// Parameter carrying an inline JSON configuration document.
pub const CONFIG_PARAM: &str = "config";

// ============================================================================
// File loader
// ============================================================================

pub struct FileConfigLoader {
    /// Maximum configuration file size (bytes).
    max_size: u64,
}

impl FileConfigLoader {
    /// Create a file loader with the default 1 MiB size cap.
    pub fn new() -> Self {
        Self {
            max_size: 1024 * 1024,
        }
    }

    pub fn with_limit(max_size: u64) -> Self {
        Self { max_size }
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(
        &self,
        scope_name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ScopeConfig, LoaderError> {
        let file = params
            .get(FILE_PARAM)
            .ok_or_else(|| LoaderError::MissingParameter(FILE_PARAM.to_owned()))?;
        let path = Path::new(file);
        debug!(scope = scope_name, path = %path.display(), "loading scope configuration from file");

        if !path.exists() {
            return Err(LoaderError::NotFound(file.clone()));
        }

        let size = fs::metadata(path)?.len();
        if size > self.max_size {
            return Err(LoaderError::TooLarge {
                size,
                limit: self.max_size,
            });
        }

        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|e| LoaderError::Parse(format!("{}: {e}", path.display()))),
            Some("json") => serde_json::from_str(&contents)
                .map_err(|e| LoaderError::Parse(format!("{}: {e}", path.display()))),
            other => Err(LoaderError::UnsupportedFormat(
                other.unwrap_or("<none>").to_owned(),
            )),
        }
    }
}

// ============================================================================
// Inline loader
// ============================================================================

pub struct InlineConfigLoader;

impl ConfigLoader for InlineConfigLoader {
    fn load(
        &self,
        scope_name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ScopeConfig, LoaderError> {
        let document = params
            .get(CONFIG_PARAM)
            .ok_or_else(|| LoaderError::MissingParameter(CONFIG_PARAM.to_owned()))?;
        debug!(scope = scope_name, "loading inline scope configuration");
        serde_json::from_str(document).map_err(|e| LoaderError::Parse(e.to_string()))
    }
}
