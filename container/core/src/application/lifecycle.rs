// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

// Lifecycle Coordination - Create / Remove Protocols
//
// Creation walks a fixed state machine:
//
//   Validating -> Resolving -> ParentLookup -> Instantiating -> Registering
//     -> ExpandingContext -> Ready
//
// Any failure before registration registers nothing. Registration itself is
// one atomic unit under the registry lock: local context map, global name
// index, creation sequence, and the parent's child set move together.
// External calls (loaders, handler hooks, runtime instantiation and close)
// always run outside the lock; the uniqueness and parent checks performed
// before those calls are advisory and re-verified at registration time.
//
// Nested context-scope creation happens after the owning scope is
// registered. Each nested creation is an independent atomic operation: a
// failure surfaces to the caller but does not undo already-registered
// siblings.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::container::ContainerCore;
use crate::application::resolver::ResolveError;
use crate::domain::config::{ScopeConfig, RESOURCE_CONTEXT};
use crate::domain::handler::{HandlerError, LifecycleHandler};
use crate::domain::runtime::RuntimeError;
use crate::domain::scope::{Context, Scope};
use crate::infrastructure::plugin::PluginError;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Scope name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("A scope named '{0}' is already registered")]
    DuplicateName(String),

    #[error("Parent scope '{parent}' of '{scope}' is not registered")]
    UnknownParent { scope: String, parent: String },

    #[error("Failed to instantiate scope '{scope}'")]
    Instantiation {
        scope: String,
        #[source]
        source: RuntimeError,
    },

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Hook(#[from] HandlerError),

    #[error("Scope '{0}' still owns nested context scopes")]
    NonEmptyContext(String),

    #[error("Scope '{child}' still declares '{parent}' as its parent")]
    ActiveChild { parent: String, child: String },

    #[error("The owning context is no longer attached to a live container")]
    ContextDetached,
}

impl Context {
    /// Create a scope from `config` inside this context.
    ///
    /// The configuration is resolved through its loader chain, lifecycle
    /// hooks run against the resolved copy, and the scope is registered
    /// atomically in this context's local map, the global name index, and
    /// the creation sequence. Nested context-scope configurations are then
    /// created recursively inside the new scope's own context.
    pub fn create(&self, config: ScopeConfig) -> Result<Arc<Scope>, ScopeError> {
        let core = self.core()?;
        create_in(&core, self, config)
    }

    /// Remove a locally-registered scope.
    ///
    /// `Ok(false)` when the name is unknown globally or not held by this
    /// context; removal of nothing is not an error. Fails without touching
    /// registry state while the scope still owns nested context scopes or
    /// another live scope declares it as parent.
    pub fn remove(&self, name: &str) -> Result<bool, ScopeError> {
        let core = self.core()?;

        let scope = {
            let mut registry = core.registry.lock();
            if !registry.contains(name) {
                return Ok(false);
            }
            let Some(scope) = self.peek(name) else {
                debug!(scope = name, "remove: not held by this context");
                return Ok(false);
            };
            if scope.context().is_some_and(Context::holds_entries) {
                return Err(ScopeError::NonEmptyContext(name.to_owned()));
            }
            if let Some(child) = registry.first_child_of(name) {
                return Err(ScopeError::ActiveChild {
                    parent: name.to_owned(),
                    child: child.to_owned(),
                });
            }
            scope.deactivate();
            registry.unregister(name);
            self.take(name);
            scope
        };

        // Shutdown hook runs outside the lock. The unregistration stands
        // even if the collaborator fails; registry state stays consistent.
        if let Err(error) = scope.runtime().close() {
            warn!(scope = name, %error, "scope runtime close failed during removal");
        }
        info!(scope = name, "scope removed");
        Ok(true)
    }

    pub(crate) fn core(&self) -> Result<Arc<ContainerCore>, ScopeError> {
        self.core.upgrade().ok_or(ScopeError::ContextDetached)
    }
}

pub(crate) fn create_in(
    core: &Arc<ContainerCore>,
    owner: &Context,
    config: ScopeConfig,
) -> Result<Arc<Scope>, ScopeError> {
    // Validating
    if config.name.is_empty() {
        return Err(ScopeError::EmptyName);
    }
    // Fast collision check; registration re-verifies under the same lock.
    if core.registry.lock().contains(&config.name) {
        return Err(ScopeError::DuplicateName(config.name));
    }

    // Resolving
    let mut resolved = core.resolver.resolve(config)?;
    if resolved.name.is_empty() {
        return Err(ScopeError::EmptyName);
    }

    let handler: Option<Box<dyn LifecycleHandler>> = match &resolved.handler {
        Some(type_id) => Some(core.handlers.instantiate(type_id)?),
        None => None,
    };
    if let Some(handler) = &handler {
        handler.on_config_loaded(&mut resolved)?;
    }

    // ParentLookup
    if let Some(parent) = &resolved.parent {
        if !core.registry.lock().contains(parent) {
            return Err(ScopeError::UnknownParent {
                scope: resolved.name.clone(),
                parent: parent.clone(),
            });
        }
    }

    // Instantiating
    let runtime = core
        .runtimes
        .instantiate(&resolved)
        .map_err(|source| ScopeError::Instantiation {
            scope: resolved.name.clone(),
            source,
        })?;
    let scope = Arc::new(Scope::new(
        resolved.clone(),
        owner.owner().map(str::to_owned),
        runtime,
        Arc::downgrade(core),
    ));
    if let Some(handler) = &handler {
        handler.on_scope_created(&resolved, &scope)?;
    }

    // Registering: one atomic unit. The lock was released during external
    // calls, so uniqueness and parent presence are decided here.
    {
        let mut registry = core.registry.lock();
        if registry.contains(scope.name()) {
            return Err(ScopeError::DuplicateName(scope.name().to_owned()));
        }
        if let Some(parent) = scope.parent_name() {
            if !registry.contains(parent) {
                return Err(ScopeError::UnknownParent {
                    scope: scope.name().to_owned(),
                    parent: parent.to_owned(),
                });
            }
        }
        if let Some(domain) = owner.owner() {
            if !registry.contains(domain) {
                return Err(ScopeError::ContextDetached);
            }
        }
        registry.register(scope.clone());
        owner.insert(scope.clone());
    }
    info!(
        scope = scope.name(),
        id = %scope.id(),
        domain = scope.domain_name().unwrap_or("-"),
        "scope registered"
    );

    // ExpandingContext: each nested creation is independently atomic;
    // earlier siblings stay registered if a later one fails.
    for (key, mut nested) in resolved.context_scopes.clone() {
        if nested.name.is_empty() {
            nested.name = key;
        }
        if nested.param(RESOURCE_CONTEXT).is_none() {
            if let Some(resource_context) = resolved.param(RESOURCE_CONTEXT) {
                nested
                    .params
                    .insert(RESOURCE_CONTEXT.to_owned(), resource_context.to_owned());
            }
        }
        scope.child_context().create(nested)?;
    }

    Ok(scope)
}
