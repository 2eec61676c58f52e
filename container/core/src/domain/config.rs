// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

// Scope Configuration Types
//
// Defines the configuration value a scope is built from, including:
// - Initialization parameters (unique keys, order-independent)
// - Configuration-level parent reference
// - Nested context-scope configurations keyed by their own name
// - Configuration-loader and lifecycle-handler type references
//
// A ScopeConfig is a pure value. It is owned by the caller until consumed by
// create(); the resolved copy is owned by the registry for the scope's
// lifetime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter key carrying the resource-context hint. When a configuration
/// references another one through a loader, or declares nested context
/// scopes, this value flows from the more specific configuration to the less
/// specific one whenever the target has not set it.
pub const RESOURCE_CONTEXT: &str = "resource.context";

/// Configuration a scope is instantiated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Scope name. Must be non-empty by the time the scope is created; nested
    /// configurations may leave it empty and inherit their context key.
    #[serde(default)]
    pub name: String,

    /// Initialization parameters. Keys are unique, insertion order is
    /// irrelevant; a sorted map keeps serialization deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Configuration-level parent reference. The parent must already be
    /// registered when this scope is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Nested context-scope configurations, keyed by their own name. Created
    /// inside the new scope's own context after registration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context_scopes: BTreeMap<String, ScopeConfig>,

    /// Configuration-loader type identifier. When set, resolution chains
    /// through the referenced configuration source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    /// Lifecycle-event-handler type identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl ScopeConfig {
    /// Create a configuration with the given name and nothing else set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Add a nested context-scope configuration, keyed by its name.
    pub fn with_context_scope(mut self, config: ScopeConfig) -> Self {
        self.context_scopes.insert(config.name.clone(), config);
        self
    }

    /// Look up an initialization parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A configuration with no loader reference is terminal: resolving it
    /// returns it unchanged.
    pub fn is_resolved(&self) -> bool {
        self.loader.is_none()
    }

    /// Overlay every field explicitly set on `self` onto `base` and return
    /// the merged configuration. Caller-supplied values always win over
    /// referenced/base values. The merged result carries no loader reference:
    /// the chain it named has been consumed.
    pub fn overlay_onto(self, mut base: ScopeConfig) -> ScopeConfig {
        if !self.name.is_empty() {
            base.name = self.name;
        }
        if self.parent.is_some() {
            base.parent = self.parent;
        }
        if self.handler.is_some() {
            base.handler = self.handler;
        }
        for (key, value) in self.params {
            base.params.insert(key, value);
        }
        for (name, config) in self.context_scopes {
            base.context_scopes.insert(name, config);
        }
        base.loader = None;
        base
    }
}
