// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.

use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, Permission, PermissionKey};
use crate::memory::{MemoryStore, MemoryStoreError};
use crate::overrides::OverrideMap;
use crate::role::Role;
use crate::traits::{FlagStore, OverrideStore, SubjectId};

impl SubjectId for char {}
impl SubjectId for u32 {}

pub fn permission(key: &str, category: &str, dependent_of: Option<&str>) -> Permission {
    Permission {
        key: key.into(),
        label: key.replace('_', " "),
        description: format!("Allows the subject to {}", key.replace('_', " ")),
        category: category.to_string(),
        dependent_of: dependent_of.map(PermissionKey::from),
    }
}

pub fn sample_permissions() -> Vec<Permission> {
    vec![
        permission("manage_spaces", "spaces", None),
        permission("manage_media", "media", None),
        permission("manage_media_folders", "media", Some("manage_media")),
        permission("manage_accounting", "accounting", None),
        permission("manage_events", "events", None),
        permission("edit_opening_hours", "hours", None),
    ]
}

pub fn sample_catalog() -> Catalog {
    Catalog::new(sample_permissions()).expect("sample catalog is valid")
}

pub fn sample_defaults() -> HashMap<Role, HashSet<PermissionKey>> {
    let staff: HashSet<PermissionKey> = [
        "manage_media",
        "manage_media_folders",
        "manage_events",
        "edit_opening_hours",
    ]
    .into_iter()
    .map(PermissionKey::from)
    .collect();

    let all: HashSet<PermissionKey> = sample_permissions()
        .into_iter()
        .map(|permission| permission.key)
        .collect();

    HashMap::from([
        (Role::Staff, staff),
        (Role::Admin, all.clone()),
        (Role::Oracle, all),
    ])
}

/// A memory store seeded with the sample catalog and role defaults, keyed by `char` subjects.
pub fn sample_store() -> MemoryStore<char> {
    MemoryStore::new(sample_permissions(), sample_defaults())
}

/// A store whose calls never resolve, for exercising the bounded-timeout path.
#[derive(Clone, Copy, Debug, Default)]
pub struct StalledStore;

impl<ID> OverrideStore<ID> for StalledStore
where
    ID: SubjectId,
{
    type Error = MemoryStoreError;

    async fn overrides(&self, _subject: &ID) -> Result<OverrideMap, Self::Error> {
        std::future::pending().await
    }

    async fn replace_overrides(
        &self,
        _subject: &ID,
        _overrides: &OverrideMap,
        _actor: &ID,
    ) -> Result<(), Self::Error> {
        std::future::pending().await
    }

    async fn reset_to_defaults(&self, _subject: &ID) -> Result<(), Self::Error> {
        std::future::pending().await
    }
}

impl<ID> FlagStore<ID> for StalledStore
where
    ID: SubjectId,
{
    type Error = MemoryStoreError;

    async fn pinned_flag(&self, _subject: &ID) -> Result<Option<bool>, Self::Error> {
        std::future::pending().await
    }

    async fn set_pinned_flag(
        &self,
        _subject: &ID,
        _value: Option<bool>,
    ) -> Result<(), Self::Error> {
        std::future::pending().await
    }

    async fn recompute_all_flags(&self, _today: u64) -> Result<usize, Self::Error> {
        std::future::pending().await
    }
}

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
