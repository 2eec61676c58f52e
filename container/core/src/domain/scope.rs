// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0
//! Scope and context types.
//!
//! A [`Scope`] is a named, long-lived runtime instance. Its name is immutable
//! once registered and globally unique across every context in the process.
//! Parent and domain relations are held by name and resolved through the
//! registry, never as owning pointers: a scope must not keep its parent or
//! domain alive beyond their own lifecycle.
//!
//! A [`Context`] is the per-scope registry of directly-owned nested scopes.
//! Read operations (`exists`, `get`, `list`) take only the context's own
//! lock; creation and removal live in the lifecycle coordinator and always
//! acquire the process-wide registry lock first.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use uuid::Uuid;

use crate::application::container::ContainerCore;
use crate::domain::config::ScopeConfig;
use crate::domain::runtime::ScopeRuntime;

/// A unique identifier for a scope instance. Diagnostics only: every
/// invariant in the registry is keyed by the scope's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named, registered execution environment.
pub struct Scope {
    id: ScopeId,
    name: String,
    parent: Option<String>,
    domain: Option<String>,
    config: ScopeConfig,
    runtime: Box<dyn ScopeRuntime>,
    active: AtomicBool,
    created_at: DateTime<Utc>,
    core: Weak<ContainerCore>,
    context: OnceLock<Context>,
}

impl Scope {
    pub(crate) fn new(
        config: ScopeConfig,
        domain: Option<String>,
        runtime: Box<dyn ScopeRuntime>,
        core: Weak<ContainerCore>,
    ) -> Self {
        Self {
            id: ScopeId::new(),
            name: config.name.clone(),
            parent: config.parent.clone(),
            domain,
            config,
            runtime,
            active: AtomicBool::new(true),
            created_at: Utc::now(),
            core,
            context: OnceLock::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration-level parent, used for parameter/service inheritance.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The scope in whose context this one was created. `None` for scopes
    /// created at the container root.
    pub fn domain_name(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The resolved configuration this scope was instantiated from.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True while the scope is registered and its runtime reports activity.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.runtime.is_active()
    }

    /// The context of nested scopes, if this scope ever hosted any.
    pub fn context(&self) -> Option<&Context> {
        self.context.get()
    }

    /// The context nested scopes are created in, allocated on first use.
    pub fn child_context(&self) -> &Context {
        self.context
            .get_or_init(|| Context::new(self.core.clone(), Some(self.name.clone())))
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn runtime(&self) -> &dyn ScopeRuntime {
        self.runtime.as_ref()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("domain", &self.domain)
            .field("active", &self.active.load(Ordering::Relaxed))
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Per-scope registry of directly-owned nested scopes.
///
/// The local map is allocated lazily on first insert, so a context that has
/// never held anything is distinguishable from one that held scopes and lost
/// them again: `list` returns `None` for the former and an empty set for the
/// latter.
pub struct Context {
    pub(crate) core: Weak<ContainerCore>,
    owner: Option<String>,
    entries: Mutex<Option<HashMap<String, Arc<Scope>>>>,
}

impl Context {
    pub(crate) fn new(core: Weak<ContainerCore>, owner: Option<String>) -> Self {
        Self {
            core,
            owner,
            entries: Mutex::new(None),
        }
    }

    /// Name of the scope owning this context; `None` for the container root.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// True iff the local map holds `name` and the bound scope is active.
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a locally-registered scope. Inactive scopes are treated as not
    /// found; they are never returned to callers.
    pub fn get(&self, name: &str) -> Option<Arc<Scope>> {
        let entries = self.entries.lock();
        entries
            .as_ref()?
            .get(name)
            .filter(|scope| scope.is_active())
            .cloned()
    }

    /// Names of all locally-registered scopes, sorted. `None` when this
    /// context has never held anything.
    pub fn list(&self) -> Option<Vec<String>> {
        let entries = self.entries.lock();
        entries.as_ref().map(|map| {
            let mut names: Vec<String> = map.keys().cloned().collect();
            names.sort();
            names
        })
    }

    /// Delegate `list` to the named scope's own context. `None` when the
    /// scope is unknown here or has no context.
    pub fn list_in(&self, name: &str) -> Option<Vec<String>> {
        self.get(name)?.context().and_then(Context::list)
    }

    /// Raw local lookup, ignoring the activity filter. Removal needs to see
    /// entries whose runtime already reports inactive.
    pub(crate) fn peek(&self, name: &str) -> Option<Arc<Scope>> {
        let entries = self.entries.lock();
        entries.as_ref()?.get(name).cloned()
    }

    pub(crate) fn holds_entries(&self) -> bool {
        self.entries
            .lock()
            .as_ref()
            .is_some_and(|map| !map.is_empty())
    }

    pub(crate) fn insert(&self, scope: Arc<Scope>) {
        let mut entries = self.entries.lock();
        entries
            .get_or_insert_with(HashMap::new)
            .insert(scope.name().to_owned(), scope);
    }

    pub(crate) fn take(&self, name: &str) -> Option<Arc<Scope>> {
        let mut entries = self.entries.lock();
        entries.as_mut()?.remove(name)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("owner", &self.owner)
            .field("entries", &self.list())
            .finish_non_exhaustive()
    }
}
