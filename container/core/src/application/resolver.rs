// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0

// Configuration Resolution - Chained Configuration Merge
//
// A configuration may reference another configuration source through a
// loader type. Resolution follows the chain to its terminal configuration
// and merges on the way back out: a right-fold with override-on-unwind
// semantics, so values set closer to the caller always win.
//
// The chain must terminate. A visited set of configuration identities
// (loader id + parameter fingerprint) turns a self-referencing chain into a
// clean Cycle error instead of unbounded recursion.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::config::{ScopeConfig, RESOURCE_CONTEXT};
use crate::domain::loader::LoaderError;
use crate::infrastructure::plugin::{LoaderRegistry, PluginError};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Configuration loader '{0}' is not registered")]
    UnknownLoader(String),

    #[error("Failed to construct configuration loader '{type_id}'")]
    Construction {
        type_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration loader '{loader}' failed for scope '{scope}'")]
    Loader {
        loader: String,
        scope: String,
        #[source]
        source: LoaderError,
    },

    #[error("Configuration loader chain cycles back through '{loader}' for scope '{scope}'")]
    Cycle { loader: String, scope: String },
}

/// Resolves chained scope configurations into a single merged descriptor.
pub struct ConfigResolver {
    loaders: Arc<LoaderRegistry>,
}

impl ConfigResolver {
    pub fn new(loaders: Arc<LoaderRegistry>) -> Self {
        Self { loaders }
    }

    /// Resolve `config` into its merged form.
    ///
    /// Idempotent: a configuration without a loader reference is returned
    /// unchanged, and every merged result carries no loader reference.
    pub fn resolve(&self, config: ScopeConfig) -> Result<ScopeConfig, ResolveError> {
        let mut visited = HashSet::new();
        self.resolve_chain(config, &mut visited)
    }

    fn resolve_chain(
        &self,
        config: ScopeConfig,
        visited: &mut HashSet<String>,
    ) -> Result<ScopeConfig, ResolveError> {
        let Some(loader_id) = config.loader.clone() else {
            return Ok(config);
        };

        if !visited.insert(Self::identity(&loader_id, &config.params)) {
            return Err(ResolveError::Cycle {
                loader: loader_id,
                scope: config.name.clone(),
            });
        }

        debug!(scope = %config.name, loader = %loader_id, "resolving referenced configuration");
        let loader = self
            .loaders
            .instantiate(&loader_id)
            .map_err(|e| match e {
                PluginError::NotRegistered(id) => ResolveError::UnknownLoader(id),
                PluginError::Construction { type_id, source } => {
                    ResolveError::Construction { type_id, source }
                }
            })?;

        let mut referenced =
            loader
                .load(&config.name, &config.params)
                .map_err(|source| ResolveError::Loader {
                    loader: loader_id.clone(),
                    scope: config.name.clone(),
                    source,
                })?;

        // The resource-context hint flows from the more specific
        // configuration to the less specific one it references.
        if referenced.param(RESOURCE_CONTEXT).is_none() {
            if let Some(resource_context) = config.param(RESOURCE_CONTEXT) {
                referenced
                    .params
                    .insert(RESOURCE_CONTEXT.to_owned(), resource_context.to_owned());
            }
        }

        let base = self.resolve_chain(referenced, visited)?;
        Ok(config.overlay_onto(base))
    }

    fn identity(loader: &str, params: &BTreeMap<String, String>) -> String {
        let mut identity = String::from(loader);
        for (key, value) in params {
            identity.push('\u{1f}');
            identity.push_str(key);
            identity.push('\u{1f}');
            identity.push_str(value);
        }
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loader::ConfigLoader;

    /// Test loader returning a canned configuration regardless of params.
    struct CannedLoader(ScopeConfig);

    impl ConfigLoader for CannedLoader {
        fn load(
            &self,
            _scope_name: &str,
            _params: &BTreeMap<String, String>,
        ) -> Result<ScopeConfig, LoaderError> {
            Ok(self.0.clone())
        }
    }

    fn resolver_with(type_id: &str, canned: ScopeConfig) -> ConfigResolver {
        let mut loaders = LoaderRegistry::new("configuration loader");
        loaders.register(type_id.to_owned(), move || {
            Ok(Box::new(CannedLoader(canned.clone())))
        });
        ConfigResolver::new(Arc::new(loaders))
    }

    #[test]
    fn test_terminal_config_is_returned_unchanged() {
        let resolver = ConfigResolver::new(Arc::new(LoaderRegistry::new("configuration loader")));
        let config = ScopeConfig::named("core").with_param("k", "v");
        let resolved = resolver.resolve(config.clone()).expect("resolve");
        assert_eq!(resolved, config);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let base = ScopeConfig::named("base").with_param("datastore", "fallback");
        let resolver = resolver_with("canned", base);

        let first = resolver
            .resolve(ScopeConfig::named("billing").with_loader("canned"))
            .expect("resolve");
        let second = resolver.resolve(first.clone()).expect("re-resolve");
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlay_on_unwind_caller_wins() {
        let base = ScopeConfig::named("base")
            .with_param("datastore", "fallback")
            .with_param("mailhost", "mx1");
        let resolver = resolver_with("canned", base);

        let resolved = resolver
            .resolve(
                ScopeConfig::named("billing")
                    .with_loader("canned")
                    .with_param("datastore", "primary"),
            )
            .expect("resolve");

        assert_eq!(resolved.name, "billing");
        assert_eq!(resolved.param("datastore"), Some("primary"));
        assert_eq!(resolved.param("mailhost"), Some("mx1"));
        assert!(resolved.is_resolved());
    }

    #[test]
    fn test_two_level_chain_merges_outward() {
        // terminal <- middle <- top
        let terminal = ScopeConfig::named("terminal")
            .with_param("a", "terminal")
            .with_param("b", "terminal")
            .with_param("c", "terminal");
        let middle = ScopeConfig::default()
            .with_loader("terminal")
            .with_param("b", "middle")
            .with_param("c", "middle");

        let mut loaders = LoaderRegistry::new("configuration loader");
        let terminal_clone = terminal.clone();
        loaders.register("terminal", move || {
            Ok(Box::new(CannedLoader(terminal_clone.clone())))
        });
        let middle_clone = middle.clone();
        loaders.register("middle", move || {
            Ok(Box::new(CannedLoader(middle_clone.clone())))
        });
        let resolver = ConfigResolver::new(Arc::new(loaders));

        let resolved = resolver
            .resolve(
                ScopeConfig::named("top")
                    .with_loader("middle")
                    .with_param("c", "top"),
            )
            .expect("resolve");

        assert_eq!(resolved.param("a"), Some("terminal"));
        assert_eq!(resolved.param("b"), Some("middle"));
        assert_eq!(resolved.param("c"), Some("top"));
        assert_eq!(resolved.name, "top");
    }

    #[test]
    fn test_resource_context_flows_down_the_chain() {
        let base = ScopeConfig::named("base");
        let resolver = resolver_with("canned", base);

        let resolved = resolver
            .resolve(
                ScopeConfig::named("billing")
                    .with_loader("canned")
                    .with_param(RESOURCE_CONTEXT, "tenant-7"),
            )
            .expect("resolve");
        assert_eq!(resolved.param(RESOURCE_CONTEXT), Some("tenant-7"));
    }

    #[test]
    fn test_resource_context_does_not_override_referenced_value() {
        let base = ScopeConfig::named("base").with_param(RESOURCE_CONTEXT, "tenant-base");
        let mut loaders = LoaderRegistry::new("configuration loader");
        loaders.register("canned", move || Ok(Box::new(CannedLoader(base.clone()))));
        let resolver = ConfigResolver::new(Arc::new(loaders));

        // No resource context on the caller side; base keeps its own.
        let resolved = resolver
            .resolve(ScopeConfig::named("billing").with_loader("canned"))
            .expect("resolve");
        assert_eq!(resolved.param(RESOURCE_CONTEXT), Some("tenant-base"));
    }

    #[test]
    fn test_unknown_loader() {
        let resolver = ConfigResolver::new(Arc::new(LoaderRegistry::new("configuration loader")));
        let err = resolver
            .resolve(ScopeConfig::named("billing").with_loader("missing"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownLoader(id) if id == "missing"));
    }

    #[test]
    fn test_loader_failure_is_surfaced() {
        let mut loaders = LoaderRegistry::new("configuration loader");
        loaders.register("flaky", || Ok(Box::new(FailingLoader)));
        let resolver = ConfigResolver::new(Arc::new(loaders));

        let err = resolver
            .resolve(ScopeConfig::named("billing").with_loader("flaky"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Loader { loader, .. } if loader == "flaky"));
    }

    struct FailingLoader;

    impl ConfigLoader for FailingLoader {
        fn load(
            &self,
            _scope_name: &str,
            _params: &BTreeMap<String, String>,
        ) -> Result<ScopeConfig, LoaderError> {
            Err(LoaderError::NotFound("backing store".to_owned()))
        }
    }

    #[test]
    fn test_self_referencing_chain_is_a_cycle() {
        // The canned configuration references the same loader with the same
        // parameters, so the chain never terminates on its own.
        let looping = ScopeConfig::default().with_loader("loop");
        let resolver = resolver_with("loop", looping);

        let err = resolver
            .resolve(ScopeConfig::named("billing").with_loader("loop"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { loader, .. } if loader == "loop"));
    }

    #[test]
    fn test_distinct_parameters_are_not_a_cycle() {
        // Same loader twice with different parameters is a legitimate chain.
        let terminal = ScopeConfig::named("terminal").with_param("a", "1");
        let mut loaders = LoaderRegistry::new("configuration loader");
        loaders.register("canned", move || {
            Ok(Box::new(ParamSwitchingLoader(terminal.clone())))
        });
        let resolver = ConfigResolver::new(Arc::new(loaders));

        let resolved = resolver
            .resolve(
                ScopeConfig::named("top")
                    .with_loader("canned")
                    .with_param("step", "first"),
            )
            .expect("resolve");
        assert_eq!(resolved.param("a"), Some("1"));
    }

    /// First invocation chains once more through the same loader with
    /// different params; second invocation terminates.
    struct ParamSwitchingLoader(ScopeConfig);

    impl ConfigLoader for ParamSwitchingLoader {
        fn load(
            &self,
            _scope_name: &str,
            params: &BTreeMap<String, String>,
        ) -> Result<ScopeConfig, LoaderError> {
            if params.get("step").map(String::as_str) == Some("first") {
                Ok(ScopeConfig::default()
                    .with_loader("canned")
                    .with_param("step", "second"))
            } else {
                Ok(self.0.clone())
            }
        }
    }
}
