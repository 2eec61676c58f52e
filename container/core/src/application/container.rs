// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0
//! Scope container: the process entry point for the registry.
//!
//! A [`ScopeContainer`] owns the shared registry state (name index, creation
//! sequence, child sets behind one lock) together with the configuration
//! resolver and the plugin registries, and exposes the root [`Context`].
//! Nothing here is a hidden singleton: tests build as many isolated
//! containers as they need.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::lifecycle::ScopeError;
use crate::application::registry::GlobalRegistry;
use crate::application::resolver::ConfigResolver;
use crate::domain::config::ScopeConfig;
use crate::domain::runtime::ScopeRuntimeFactory;
use crate::domain::scope::{Context, Scope};
use crate::infrastructure::handlers::{TracingLifecycleHandler, TRACING_HANDLER};
use crate::infrastructure::loaders::{
    FileConfigLoader, InlineConfigLoader, FILE_LOADER, INLINE_LOADER,
};
use crate::infrastructure::plugin::{HandlerRegistry, LoaderRegistry};
use crate::infrastructure::runtime::StandardRuntimeFactory;

/// Shared state behind every context of one container.
pub struct ContainerCore {
    /// The process-wide registry lock. Mutations always take this before any
    /// local context lock (global-then-local ordering).
    pub(crate) registry: Mutex<GlobalRegistry>,
    pub(crate) resolver: ConfigResolver,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) runtimes: Box<dyn ScopeRuntimeFactory>,
}

/// Builder assembling the closed plugin sets of a container.
pub struct ScopeContainerBuilder {
    loaders: LoaderRegistry,
    handlers: HandlerRegistry,
    runtimes: Option<Box<dyn ScopeRuntimeFactory>>,
}

impl ScopeContainerBuilder {
    fn new() -> Self {
        let mut loaders = LoaderRegistry::new("configuration loader");
        loaders.register(FILE_LOADER, || Ok(Box::new(FileConfigLoader::new())));
        loaders.register(INLINE_LOADER, || Ok(Box::new(InlineConfigLoader)));

        let mut handlers = HandlerRegistry::new("lifecycle handler");
        handlers.register(TRACING_HANDLER, || Ok(Box::new(TracingLifecycleHandler)));

        Self {
            loaders,
            handlers,
            runtimes: None,
        }
    }

    /// Register a configuration-loader constructor under `type_id`.
    pub fn register_loader<F>(mut self, type_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn crate::domain::loader::ConfigLoader>>
            + Send
            + Sync
            + 'static,
    {
        self.loaders.register(type_id, factory);
        self
    }

    /// Register a lifecycle-handler constructor under `type_id`.
    pub fn register_handler<F>(mut self, type_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn crate::domain::handler::LifecycleHandler>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.register(type_id, factory);
        self
    }

    /// Replace the runtime factory scopes are instantiated through.
    pub fn runtime_factory(mut self, factory: impl ScopeRuntimeFactory + 'static) -> Self {
        self.runtimes = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> ScopeContainer {
        let core = Arc::new(ContainerCore {
            registry: Mutex::new(GlobalRegistry::new()),
            resolver: ConfigResolver::new(Arc::new(self.loaders)),
            handlers: self.handlers,
            runtimes: self
                .runtimes
                .unwrap_or_else(|| Box::new(StandardRuntimeFactory)),
        });
        let root = Context::new(Arc::downgrade(&core), None);
        info!("scope container initialized");
        ScopeContainer { core, root }
    }
}

/// The container: root context plus the shared registry state.
pub struct ScopeContainer {
    core: Arc<ContainerCore>,
    root: Context,
}

impl ScopeContainer {
    /// A container with the default plugin sets (file/inline loaders, the
    /// tracing handler, the standard runtime factory).
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ScopeContainerBuilder {
        ScopeContainerBuilder::new()
    }

    /// The root context. Scopes created here have no domain.
    pub fn context(&self) -> &Context {
        &self.root
    }

    pub fn create(&self, config: ScopeConfig) -> Result<Arc<Scope>, ScopeError> {
        self.root.create(config)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.root.exists(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Scope>> {
        self.root.get(name)
    }

    pub fn list(&self) -> Option<Vec<String>> {
        self.root.list()
    }

    pub fn list_in(&self, name: &str) -> Option<Vec<String>> {
        self.root.list_in(name)
    }

    pub fn remove(&self, name: &str) -> Result<bool, ScopeError> {
        self.root.remove(name)
    }

    /// Number of live scopes across every context of this container.
    pub fn len(&self) -> usize {
        self.core.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear down every scope in reverse creation order.
    ///
    /// Because removal always targets the most recently created scope, the
    /// non-empty-context and live-child invariants hold by construction
    /// whenever creation respected parent and nesting order; no dependency
    /// graph is computed.
    pub fn shutdown_all(&self) -> Result<(), ScopeError> {
        info!("shutting down all scopes");
        loop {
            let Some(scope) = self.core.registry.lock().newest() else {
                return Ok(());
            };
            let name = scope.name().to_owned();

            let removed = match scope.domain_name() {
                None => self.root.remove(&name)?,
                Some(domain) => {
                    let owner = self.core.registry.lock().get(domain).cloned();
                    match owner.as_ref().and_then(|owner| owner.context()) {
                        Some(context) => context.remove(&name)?,
                        None => false,
                    }
                }
            };

            if !removed && self.core.registry.lock().contains(&name) {
                // The scope is still registered but unreachable through its
                // owning context; bail out instead of spinning.
                warn!(scope = %name, "shutdown: scope not removable through its owning context");
                return Ok(());
            }
        }
    }
}

impl Default for ScopeContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_starts_empty() {
        let container = ScopeContainer::new();
        assert!(container.is_empty());
        assert_eq!(container.list(), None);
    }

    #[test]
    fn test_isolated_containers_do_not_share_names() {
        let first = ScopeContainer::new();
        let second = ScopeContainer::new();

        first.create(ScopeConfig::named("core")).expect("create");
        second
            .create(ScopeConfig::named("core"))
            .expect("same name in an isolated container");
    }

    #[test]
    fn test_context_outliving_container_is_detached() {
        let container = ScopeContainer::new();
        let scope = container.create(ScopeConfig::named("core")).expect("create");
        drop(container);

        let err = scope
            .child_context()
            .create(ScopeConfig::named("orphan"))
            .unwrap_err();
        assert!(matches!(err, ScopeError::ContextDetached));
    }
}
