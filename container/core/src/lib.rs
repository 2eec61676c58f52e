// Copyright (c) 2026 Arbor Labs
// SPDX-License-Identifier: AGPL-3.0
//! Scope registry and lifecycle coordination core.
//!
//! A [`application::container::ScopeContainer`] owns the process-wide scope
//! bookkeeping: the global name index, the creation-ordered sequence, and the
//! per-scope `Context` registries. Scopes are created from [`domain::config::ScopeConfig`]
//! values, resolved through chained configuration loaders, and torn down in
//! reverse creation order.
//!
//! # Architecture
//!
//! - **domain** — configuration and scope value types plus the collaborator
//!   traits (configuration loaders, lifecycle handlers, scope runtimes)
//! - **application** — configuration resolution, the global registry, and the
//!   create/remove/shutdown-all coordination
//! - **infrastructure** — plugin registries and reference collaborator
//!   implementations

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::container::{ScopeContainer, ScopeContainerBuilder};
pub use application::lifecycle::ScopeError;
