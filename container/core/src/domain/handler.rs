// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::config::ScopeConfig;
use crate::domain::scope::Scope;
use thiserror::Error;

/// Failure of a lifecycle-event-handler hook. A hook failure aborts the
/// creation it was invoked for.
#[derive(Debug, Error)]
#[error("Lifecycle handler failed in {hook}: {message}")]
pub struct HandlerError {
    pub hook: &'static str,
    pub message: String,
}

impl HandlerError {
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}

/// Observer of scope creation, given the opportunity to rewrite the resolved
/// configuration before instantiation and to inspect the newly created scope.
///
/// Both hooks default to no-ops; implementations override what they need.
pub trait LifecycleHandler: Send + Sync {
    /// Invoked after configuration resolution, before parent lookup and
    /// instantiation. May rewrite parameters on the resolved configuration.
    fn on_config_loaded(&self, config: &mut ScopeConfig) -> Result<(), HandlerError> {
        let _ = config;
        Ok(())
    }

    /// Invoked after the scope is instantiated, before registration.
    fn on_scope_created(&self, config: &ScopeConfig, scope: &Scope) -> Result<(), HandlerError> {
        let _ = (config, scope);
        Ok(())
    }
}
