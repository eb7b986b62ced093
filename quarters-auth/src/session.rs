// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-edit-session state for a subject's permission table.
//!
//! An [`EditSession`] is an explicit context object holding everything one admin edit of one
//! subject needs: the catalog, the subject's role defaults, the live override map and the
//! snapshot taken at open. All toggling happens in memory; nothing reaches the store until
//! [`EditSession::commit`] replaces the subject's whole override set in a single call.

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::catalog::{Catalog, CatalogError, PermissionKey};
use crate::dirty::Snapshot;
use crate::overrides::{OverrideMap, ToggleState};
use crate::resolver;
use crate::role::Role;
use crate::traits::{OverrideStore, PolicyStore, SubjectId};

/// Upper bound for a single persistence call. Expiry is treated as a failed call.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: Error,
{
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Transient store failure. Retryable; pre-commit state is left unchanged.
    #[error("store request failed: {0}")]
    Store(E),

    /// The bounded timeout expired before the store answered. Treated exactly like a store
    /// failure.
    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
}

/// An actor with an assigned role and a stable id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject<ID> {
    pub id: ID,
    pub role: Role,
}

impl<ID> Subject<ID> {
    pub fn new(id: ID, role: Role) -> Self {
        Self { id, role }
    }
}

/// Await a store call under [`STORE_TIMEOUT`].
pub(crate) async fn with_timeout<T, E>(
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, EngineError<E>>
where
    E: Error,
{
    match tokio::time::timeout(STORE_TIMEOUT, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(EngineError::Store(error)),
        Err(_) => Err(EngineError::Timeout(STORE_TIMEOUT)),
    }
}

/// Load the policy data an edit session is resolved against: the permission catalog and the
/// default grants for the given role.
pub async fn load_policy<S>(
    store: &S,
    role: Role,
) -> Result<(Catalog, HashSet<PermissionKey>), EngineError<S::Error>>
where
    S: PolicyStore,
{
    let permissions = with_timeout(store.permission_catalog()).await?;
    let catalog = Catalog::new(permissions)?;
    let defaults = with_timeout(store.role_defaults(role)).await?;
    Ok((catalog, defaults))
}

#[derive(Debug)]
pub struct EditSession<ID> {
    subject: Subject<ID>,
    catalog: Catalog,
    defaults: HashSet<PermissionKey>,
    overrides: OverrideMap,
    snapshot: Snapshot,
}

impl<ID> EditSession<ID>
where
    ID: SubjectId,
{
    /// Open an edit session for a subject, loading their current override set from the store and
    /// snapshotting it.
    pub async fn open<S>(
        catalog: Catalog,
        defaults: HashSet<PermissionKey>,
        store: &S,
        subject: Subject<ID>,
    ) -> Result<Self, EngineError<S::Error>>
    where
        S: OverrideStore<ID>,
    {
        let overrides = with_timeout(store.overrides(&subject.id)).await?;
        let snapshot = Snapshot::capture(&overrides);
        debug!(subject = ?subject.id, role = %subject.role, rows = overrides.len(), "opened edit session");

        Ok(Self {
            subject,
            catalog,
            defaults,
            overrides,
            snapshot,
        })
    }

    pub fn subject(&self) -> &Subject<ID> {
        &self.subject
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The live override map as it would be persisted by the next commit.
    pub fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    /// Effective value for a single key.
    pub fn resolve(&self, key: &PermissionKey) -> Result<bool, CatalogError> {
        resolver::resolve(&self.catalog, &self.defaults, &self.overrides, key)
    }

    /// Effective value for every catalog key, for rendering the permission table.
    pub fn resolve_all(&self) -> HashMap<PermissionKey, bool> {
        resolver::resolve_all(&self.catalog, &self.defaults, &self.overrides)
    }

    /// Request a change to a permission's checked state.
    ///
    /// Writes an override only when the requested boolean differs from the role default,
    /// otherwise removes any existing override for the key. Never gated by dirty state.
    pub fn toggle(&mut self, key: &PermissionKey, desired: bool) -> Result<(), CatalogError> {
        if !self.catalog.contains(key) {
            return Err(CatalogError::UnknownPermission(key.clone()));
        }

        let default = self.defaults.contains(key);
        let changed = self.overrides.apply(key.clone(), desired, default);
        trace!(subject = ?self.subject.id, %key, desired, changed, "toggled permission");
        Ok(())
    }

    /// The interaction state of one permission's toggle, for rendering.
    pub fn toggle_state(&self, key: &PermissionKey) -> Result<ToggleState, CatalogError> {
        if !self.catalog.contains(key) {
            return Err(CatalogError::UnknownPermission(key.clone()));
        }

        Ok(ToggleState::from_override(self.overrides.get(key)))
    }

    /// Whether the live map differs from the last committed state. Gates the commit control
    /// only.
    pub fn is_dirty(&self) -> bool {
        self.snapshot.is_dirty(&self.overrides)
    }

    /// Persist the live override map, replacing the subject's entire stored set.
    ///
    /// On success the session re-snapshots and immediately reports clean. On failure or timeout
    /// the in-memory edit state is left untouched so the caller can retry.
    ///
    /// Taking `&mut self` means a second commit on this session cannot start while one is in
    /// flight; overlapping commits from *separate* sessions for the same subject are not
    /// detected and resolve last-writer-wins.
    pub async fn commit<S>(&mut self, store: &S, actor: &ID) -> Result<(), EngineError<S::Error>>
    where
        S: OverrideStore<ID>,
    {
        with_timeout(store.replace_overrides(&self.subject.id, &self.overrides, actor)).await?;
        self.snapshot = Snapshot::capture(&self.overrides);
        debug!(subject = ?self.subject.id, rows = self.overrides.len(), "committed override set");
        Ok(())
    }

    /// Delete every override for the subject, returning them to pure role defaults.
    pub async fn reset<S>(&mut self, store: &S) -> Result<(), EngineError<S::Error>>
    where
        S: OverrideStore<ID>,
    {
        with_timeout(store.reset_to_defaults(&self.subject.id)).await?;
        self.overrides.clear();
        self.snapshot = Snapshot::capture(&self.overrides);
        debug!(subject = ?self.subject.id, "reset subject to role defaults");
        Ok(())
    }
}
