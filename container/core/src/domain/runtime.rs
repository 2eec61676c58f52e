use crate::domain::config::ScopeConfig;
use thiserror::Error;

/// Errors raised by scope runtime collaborators.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to instantiate scope runtime: {0}")]
    InstantiationFailed(String),

    #[error("Failed to shut down scope runtime: {0}")]
    ShutdownFailed(String),
}

/// The concrete runtime behavior behind a registered scope.
///
/// The coordinator only consumes the shutdown hook and the activity
/// predicate; everything the runtime hosts (providers, services, clients) is
/// outside this subsystem.
pub trait ScopeRuntime: Send + Sync {
    /// Release the runtime's resources. Invoked exactly once, during removal.
    fn close(&self) -> Result<(), RuntimeError>;

    /// Whether the scope is still serving. Inactive scopes are hidden from
    /// `get`/`exists` lookups.
    fn is_active(&self) -> bool;
}

/// Builds the runtime for a scope from its resolved configuration.
pub trait ScopeRuntimeFactory: Send + Sync {
    fn instantiate(&self, config: &ScopeConfig) -> Result<Box<dyn ScopeRuntime>, RuntimeError>;
}
