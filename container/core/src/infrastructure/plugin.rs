// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

// Plugin Registry - Type Identifier to Constructor Mapping
//
// Configuration loaders and lifecycle handlers are referenced by type
// identifier from scope configurations. The registry maps each identifier to
// a constructor function, so the set of valid implementations per deployment
// is closed and checked at registration time rather than discovered
// dynamically.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::handler::LifecycleHandler;
use crate::domain::loader::ConfigLoader;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("No factory registered for type '{0}'")]
    NotRegistered(String),

    #[error("Failed to construct '{type_id}': {source}")]
    Construction {
        type_id: String,
        #[source]
        source: anyhow::Error,
    },
}

type Factory<T> = Arc<dyn Fn() -> anyhow::Result<Box<T>> + Send + Sync>;

/// Factory map from a type identifier to a constructor for `T`.
pub struct PluginRegistry<T: ?Sized> {
    kind: &'static str,
    factories: HashMap<String, Factory<T>>,
}

/// Registry of configuration-loader constructors.
pub type LoaderRegistry = PluginRegistry<dyn ConfigLoader>;

/// Registry of lifecycle-event-handler constructors.
pub type HandlerRegistry = PluginRegistry<dyn LifecycleHandler>;

impl<T: ?Sized> PluginRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    /// Register a constructor under `type_id`. A later registration for the
    /// same identifier replaces the earlier one.
    pub fn register<F>(&mut self, type_id: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Box<T>> + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        debug!(kind = self.kind, type_id = %type_id, "registering plugin factory");
        self.factories.insert(type_id, Arc::new(factory));
    }

    /// Instantiate the implementation registered under `type_id`.
    pub fn instantiate(&self, type_id: &str) -> Result<Box<T>, PluginError> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| PluginError::NotRegistered(type_id.to_owned()))?;
        factory().map_err(|source| PluginError::Construction {
            type_id: type_id.to_owned(),
            source,
        })
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered type identifiers, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }
}
