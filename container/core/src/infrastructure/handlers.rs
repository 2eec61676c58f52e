// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

use tracing::{debug, info};

use crate::domain::config::ScopeConfig;
use crate::domain::handler::{HandlerError, LifecycleHandler};
use crate::domain::scope::Scope;

/// Type identifier the tracing handler is registered under by default.
pub const TRACING_HANDLER: &str = "tracing";

/// Lifecycle handler that logs both hooks and touches nothing.
pub struct TracingLifecycleHandler;

impl LifecycleHandler for TracingLifecycleHandler {
    fn on_config_loaded(&self, config: &mut ScopeConfig) -> Result<(), HandlerError> {
        debug!(
            scope = %config.name,
            params = config.params.len(),
            context_scopes = config.context_scopes.len(),
            "scope configuration resolved"
        );
        Ok(())
    }

    fn on_scope_created(&self, config: &ScopeConfig, scope: &Scope) -> Result<(), HandlerError> {
        info!(
            scope = %config.name,
            id = %scope.id(),
            parent = config.parent.as_deref().unwrap_or("-"),
            "scope instantiated"
        );
        Ok(())
    }
}
