// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::config::ScopeConfig;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by configuration-loader collaborators.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Configuration source not found: {0}")]
    NotFound(String),

    #[error("Configuration source too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to read configuration source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

/// Turns a configuration reference (file, serialized blob, ...) into a
/// configuration value.
///
/// Implementations are instantiated per resolution through the loader
/// registry and invoked with the referencing configuration's initialization
/// parameters.
pub trait ConfigLoader: Send + Sync {
    fn load(
        &self,
        scope_name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ScopeConfig, LoaderError>;
}
