use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::config::ScopeConfig;
use crate::domain::runtime::{RuntimeError, ScopeRuntime, ScopeRuntimeFactory};

/// Default scope runtime: an activity flag and nothing else. Deployments
/// hosting real providers/services swap in their own factory through the
/// container builder.
pub struct StandardScopeRuntime {
    active: AtomicBool,
}

impl StandardScopeRuntime {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }
}

impl Default for StandardScopeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRuntime for StandardScopeRuntime {
    fn close(&self) -> Result<(), RuntimeError> {
        self.active.store(false, Ordering::Release);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

pub struct StandardRuntimeFactory;

impl ScopeRuntimeFactory for StandardRuntimeFactory {
    fn instantiate(&self, _config: &ScopeConfig) -> Result<Box<dyn ScopeRuntime>, RuntimeError> {
        Ok(Box::new(StandardScopeRuntime::new()))
    }
}
