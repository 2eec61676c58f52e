// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

// Global Registry State
//
// Process-wide bookkeeping shared by every context, guarded by the single
// registry lock in ContainerCore:
// - name index: enforces global uniqueness across all contexts
// - creation sequence: total order of successful creations, walked in
//   reverse by shutdown-all
// - child sets: which live scopes declare a given scope as parent,
//   maintained incrementally so the removal check is O(1) instead of a scan
//   of the sequence

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::scope::Scope;

pub(crate) struct GlobalRegistry {
    index: HashMap<String, Arc<Scope>>,
    sequence: Vec<Arc<Scope>>,
    children: HashMap<String, BTreeSet<String>>,
}

impl GlobalRegistry {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            sequence: Vec::new(),
            children: HashMap::new(),
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<Scope>> {
        self.index.get(name)
    }

    /// Number of live scopes across every context.
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Most recently created live scope.
    pub(crate) fn newest(&self) -> Option<Arc<Scope>> {
        self.sequence.last().cloned()
    }

    /// Record a scope in the name index, the creation sequence, and its
    /// parent's child set. The caller must hold the registry lock and must
    /// have verified uniqueness and parent presence.
    pub(crate) fn register(&mut self, scope: Arc<Scope>) {
        if let Some(parent) = scope.parent_name() {
            self.children
                .entry(parent.to_owned())
                .or_default()
                .insert(scope.name().to_owned());
        }
        self.index.insert(scope.name().to_owned(), scope.clone());
        self.sequence.push(scope);
    }

    /// Remove a scope from all three structures.
    pub(crate) fn unregister(&mut self, name: &str) -> Option<Arc<Scope>> {
        let scope = self.index.remove(name)?;
        self.sequence.retain(|entry| entry.name() != name);
        if let Some(parent) = scope.parent_name() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(name);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
        self.children.remove(name);
        Some(scope)
    }

    /// First live scope declaring `name` as its parent, if any.
    pub(crate) fn first_child_of(&self, name: &str) -> Option<&str> {
        self.children
            .get(name)
            .and_then(|children| children.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::ScopeConfig;
    use crate::infrastructure::runtime::StandardScopeRuntime;

    fn make_scope(name: &str, parent: Option<&str>) -> Arc<Scope> {
        let mut config = ScopeConfig::named(name);
        if let Some(parent) = parent {
            config = config.with_parent(parent);
        }
        Arc::new(Scope::new(
            config,
            None,
            Box::new(StandardScopeRuntime::new()),
            std::sync::Weak::new(),
        ))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = GlobalRegistry::new();
        registry.register(make_scope("core", None));

        assert!(registry.contains("core"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.newest().expect("newest").name(), "core");
    }

    #[test]
    fn test_sequence_reflects_creation_order() {
        let mut registry = GlobalRegistry::new();
        registry.register(make_scope("a", None));
        registry.register(make_scope("b", None));
        registry.register(make_scope("c", None));

        assert_eq!(registry.newest().expect("newest").name(), "c");
        registry.unregister("c");
        assert_eq!(registry.newest().expect("newest").name(), "b");
    }

    #[test]
    fn test_child_sets_track_parent_declarations() {
        let mut registry = GlobalRegistry::new();
        registry.register(make_scope("parent", None));
        registry.register(make_scope("child-b", Some("parent")));
        registry.register(make_scope("child-a", Some("parent")));

        assert_eq!(registry.first_child_of("parent"), Some("child-a"));

        registry.unregister("child-a");
        assert_eq!(registry.first_child_of("parent"), Some("child-b"));

        registry.unregister("child-b");
        assert_eq!(registry.first_child_of("parent"), None);
    }

    #[test]
    fn test_unregister_unknown_is_none() {
        let mut registry = GlobalRegistry::new();
        assert!(registry.unregister("ghost").is_none());
    }
}
