// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces towards the hosted backend.
//!
//! Any persistence layer (relational store, document store, remote API) satisfying these traits
//! can back the engine; no wire format is prescribed. The engine wraps every call in a bounded
//! timeout (see [`crate::session::STORE_TIMEOUT`]) and treats expiry as a failed call.

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash as StdHash;

use crate::catalog::{Permission, PermissionKey};
use crate::overrides::OverrideMap;
use crate::role::Role;

/// Stable identifier of an actor (subject or administrator).
pub trait SubjectId: Clone + Debug + Eq + StdHash {}

/// Read access to the immutable policy data: the permission catalog and per-role default grants.
pub trait PolicyStore {
    type Error: Error;

    /// Returns the full permission catalog. Loaded once per process or session.
    fn permission_catalog(&self) -> impl Future<Output = Result<Vec<Permission>, Self::Error>>;

    /// Returns the set of permission keys granted to a role by default.
    fn role_defaults(
        &self,
        role: Role,
    ) -> impl Future<Output = Result<HashSet<PermissionKey>, Self::Error>>;

    /// Returns, for every catalog key, the list of roles which grant it by default.
    ///
    /// Bulk read used only for audit/"included in" display; callers are expected to cache it
    /// behind [`crate::mappings::RoleMappingCache`] with explicit invalidation.
    fn all_role_mappings(
        &self,
    ) -> impl Future<Output = Result<HashMap<PermissionKey, Vec<Role>>, Self::Error>>;
}

/// Persistence of per-subject permission overrides.
pub trait OverrideStore<ID>
where
    ID: SubjectId,
{
    type Error: Error;

    /// Returns the subject's override rows only, never role defaults.
    fn overrides(&self, subject: &ID) -> impl Future<Output = Result<OverrideMap, Self::Error>>;

    /// Replaces the subject's entire override set in one call.
    ///
    /// Implementations delete all existing rows for the subject and then bulk-insert the new set
    /// stamped with `granted_by = actor` and a fresh timestamp. The two-step sequence is not
    /// transactional: when the delete succeeds but the insert fails the subject is left with zero
    /// overrides (pure role defaults) until the caller retries. Concurrent replacements for the
    /// same subject are not detected; the last writer wins.
    fn replace_overrides(
        &self,
        subject: &ID,
        overrides: &OverrideMap,
        actor: &ID,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Deletes all override rows for the subject, returning them to pure role defaults.
    fn reset_to_defaults(&self, subject: &ID) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Persistence of the residency flag: an auto-computed boolean with an optional manual pin.
pub trait FlagStore<ID>
where
    ID: SubjectId,
{
    type Error: Error;

    /// Returns the subject's manual pin, or `None` when the flag follows the computed value.
    fn pinned_flag(&self, subject: &ID) -> impl Future<Output = Result<Option<bool>, Self::Error>>;

    /// Sets or clears the subject's manual pin.
    fn set_pinned_flag(
        &self,
        subject: &ID,
        value: Option<bool>,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Recomputes the stored computed value for every subject from current interval data.
    ///
    /// Idempotent and safe to call repeatedly. Must never alter or clear any subject's pin.
    /// Not assumed safe to run concurrently with an in-flight override commit for the same
    /// subject (last-writer-wins). Returns the number of subjects whose computed value changed.
    fn recompute_all_flags(&self, today: u64) -> impl Future<Output = Result<usize, Self::Error>>;
}
