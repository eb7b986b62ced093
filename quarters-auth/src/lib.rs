// SPDX-License-Identifier: MIT OR Apache-2.0

#![cfg_attr(doctest, doc = include_str!("../README.md"))]

//! Role-default and per-subject override resolution for the Quarters admin suite.
//!
//! Two subsystems of the suite share one contract: an *effective value* is either an explicit
//! *override* or, absent one, a *default* derived from context. Permissions default to what the
//! subject's role grants and can be forced per subject; the residency flag defaults to a value
//! computed from assignment intervals and can be manually pinned. This crate implements that
//! contract once: the catalog and role defaults, the resolver, the collapse rule behind the
//! tri-state toggle, dirty tracking for batch commits, and the immediately-persisted pin cycle.
//!
//! Persistence lives behind the traits in [`traits`]; [`memory`] provides the in-memory
//! reference store.

pub mod action;
pub mod catalog;
pub mod dirty;
pub mod mappings;
pub mod memory;
pub mod overrides;
pub mod residency;
pub mod resolver;
pub mod role;
pub mod session;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use action::Action;
pub use catalog::{Catalog, CatalogError, Permission, PermissionKey};
pub use overrides::{OverrideMap, OverrideRow, ToggleState};
pub use residency::{ResidencyState, StayInterval};
pub use role::Role;
pub use session::{EditSession, EngineError, STORE_TIMEOUT, Subject};
