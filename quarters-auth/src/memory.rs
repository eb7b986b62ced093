// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory reference implementation of all store traits, for tests and local tooling.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::catalog::{Permission, PermissionKey};
use crate::overrides::{OverrideMap, OverrideRow};
use crate::residency::{StayInterval, compute_auto};
use crate::role::Role;
use crate::traits::{FlagStore, OverrideStore, PolicyStore, SubjectId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("bulk insert of override rows failed")]
    InsertFailed,
}

#[derive(Clone, Copy, Debug, Default)]
struct FlagRow {
    computed: bool,
    pinned: Option<bool>,
}

/// Single-threaded in-memory store backing the engine's persistence traits.
#[derive(Clone, Debug)]
pub struct MemoryStore<ID>
where
    ID: SubjectId,
{
    permissions: Rc<RefCell<Vec<Permission>>>,
    defaults: Rc<RefCell<HashMap<Role, HashSet<PermissionKey>>>>,
    overrides: Rc<RefCell<HashMap<ID, HashMap<PermissionKey, OverrideRow<ID>>>>>,
    flags: Rc<RefCell<HashMap<ID, FlagRow>>>,
    intervals: Rc<RefCell<HashMap<ID, Vec<StayInterval>>>>,
    fail_next_insert: Rc<RefCell<bool>>,
}

impl<ID> MemoryStore<ID>
where
    ID: SubjectId,
{
    pub fn new(
        permissions: Vec<Permission>,
        defaults: HashMap<Role, HashSet<PermissionKey>>,
    ) -> Self {
        Self {
            permissions: Rc::new(RefCell::new(permissions)),
            defaults: Rc::new(RefCell::new(defaults)),
            overrides: Rc::new(RefCell::new(HashMap::new())),
            flags: Rc::new(RefCell::new(HashMap::new())),
            intervals: Rc::new(RefCell::new(HashMap::new())),
            fail_next_insert: Rc::new(RefCell::new(false)),
        }
    }

    /// Replace a subject's assignment intervals.
    pub fn set_intervals(&self, subject: ID, intervals: Vec<StayInterval>) {
        self.intervals.borrow_mut().insert(subject, intervals);
    }

    /// Stored override rows for a subject, for audit display and assertions.
    pub fn override_rows(&self, subject: &ID) -> Vec<OverrideRow<ID>> {
        let overrides = self.overrides.borrow();
        overrides
            .get(subject)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The stored computed residency value for a subject.
    pub fn computed_flag(&self, subject: &ID) -> bool {
        let flags = self.flags.borrow();
        flags.get(subject).map(|row| row.computed).unwrap_or(false)
    }

    /// Add a key to a role's default grants.
    pub fn grant_default(&self, role: Role, key: impl Into<PermissionKey>) {
        let mut defaults = self.defaults.borrow_mut();
        defaults.entry(role).or_default().insert(key.into());
    }

    /// Make the insert step of the next `replace_overrides` call fail, leaving the subject with
    /// zero rows after the preceding delete step.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn fail_next_insert(&self) {
        *self.fail_next_insert.borrow_mut() = true;
    }
}

impl<ID> PolicyStore for MemoryStore<ID>
where
    ID: SubjectId,
{
    type Error = MemoryStoreError;

    async fn permission_catalog(&self) -> Result<Vec<Permission>, Self::Error> {
        Ok(self.permissions.borrow().clone())
    }

    async fn role_defaults(&self, role: Role) -> Result<HashSet<PermissionKey>, Self::Error> {
        let defaults = self.defaults.borrow();
        Ok(defaults.get(&role).cloned().unwrap_or_default())
    }

    async fn all_role_mappings(&self) -> Result<HashMap<PermissionKey, Vec<Role>>, Self::Error> {
        let defaults = self.defaults.borrow();
        let mut mappings: HashMap<PermissionKey, Vec<Role>> = self
            .permissions
            .borrow()
            .iter()
            .map(|permission| (permission.key.clone(), Vec::new()))
            .collect();

        // Roles in ascending order so every key's list is deterministic.
        for role in Role::all() {
            let Some(keys) = defaults.get(&role) else {
                continue;
            };
            for key in keys {
                mappings.entry(key.clone()).or_default().push(role);
            }
        }

        Ok(mappings)
    }
}

impl<ID> OverrideStore<ID> for MemoryStore<ID>
where
    ID: SubjectId,
{
    type Error = MemoryStoreError;

    async fn overrides(&self, subject: &ID) -> Result<OverrideMap, Self::Error> {
        let overrides = self.overrides.borrow();
        Ok(overrides
            .get(subject)
            .map(|rows| {
                rows.iter()
                    .map(|(key, row)| (key.clone(), row.granted))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace_overrides(
        &self,
        subject: &ID,
        overrides: &OverrideMap,
        actor: &ID,
    ) -> Result<(), Self::Error> {
        // Step one: delete all existing rows for the subject.
        self.overrides.borrow_mut().remove(subject);

        // Step two: bulk-insert the replacement set. When this step fails the subject stays at
        // zero rows, the documented partial-commit window.
        if std::mem::take(&mut *self.fail_next_insert.borrow_mut()) {
            return Err(MemoryStoreError::InsertFailed);
        }

        if overrides.is_empty() {
            return Ok(());
        }

        let granted_at = current_timestamp();
        let rows = overrides
            .iter()
            .map(|(key, granted)| {
                let row = OverrideRow {
                    key: key.clone(),
                    granted,
                    granted_by: actor.clone(),
                    granted_at,
                };
                (key.clone(), row)
            })
            .collect();
        self.overrides.borrow_mut().insert(subject.clone(), rows);

        Ok(())
    }

    async fn reset_to_defaults(&self, subject: &ID) -> Result<(), Self::Error> {
        self.overrides.borrow_mut().remove(subject);
        Ok(())
    }
}

impl<ID> FlagStore<ID> for MemoryStore<ID>
where
    ID: SubjectId,
{
    type Error = MemoryStoreError;

    async fn pinned_flag(&self, subject: &ID) -> Result<Option<bool>, Self::Error> {
        let flags = self.flags.borrow();
        Ok(flags.get(subject).and_then(|row| row.pinned))
    }

    async fn set_pinned_flag(&self, subject: &ID, value: Option<bool>) -> Result<(), Self::Error> {
        let mut flags = self.flags.borrow_mut();
        flags.entry(subject.clone()).or_default().pinned = value;
        Ok(())
    }

    async fn recompute_all_flags(&self, today: u64) -> Result<usize, Self::Error> {
        let intervals = self.intervals.borrow();
        let mut flags = self.flags.borrow_mut();
        let mut changed = 0;

        for (subject, subject_intervals) in intervals.iter() {
            let computed = compute_auto(subject_intervals, today);
            let row = flags.entry(subject.clone()).or_default();
            if row.computed != computed {
                row.computed = computed;
                changed += 1;
            }
        }

        Ok(changed)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is not behind")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use crate::overrides::OverrideMap;
    use crate::test_utils::sample_store;
    use crate::traits::OverrideStore;

    use super::MemoryStoreError;

    const TESSA: char = 'T';
    const ADMIN: char = 'A';

    #[tokio::test]
    async fn load_returns_only_override_rows() {
        let store = sample_store();
        assert!(store.overrides(&TESSA).await.unwrap().is_empty());

        let mut map = OverrideMap::new();
        map.apply("manage_media".into(), false, true);
        store.replace_overrides(&TESSA, &map, &ADMIN).await.unwrap();

        let loaded = store.overrides(&TESSA).await.unwrap();
        assert_eq!(loaded, map);
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_set() {
        let store = sample_store();

        let mut first = OverrideMap::new();
        first.apply("manage_media".into(), false, true);
        first.apply("manage_accounting".into(), true, false);
        store
            .replace_overrides(&TESSA, &first, &ADMIN)
            .await
            .unwrap();

        let mut second = OverrideMap::new();
        second.apply("manage_events".into(), false, true);
        store
            .replace_overrides(&TESSA, &second, &ADMIN)
            .await
            .unwrap();

        assert_eq!(store.overrides(&TESSA).await.unwrap(), second);
        assert_eq!(store.override_rows(&TESSA).len(), 1);
    }

    #[tokio::test]
    async fn rows_carry_audit_fields() {
        let store = sample_store();
        let mut map = OverrideMap::new();
        map.apply("manage_media".into(), false, true);
        store.replace_overrides(&TESSA, &map, &ADMIN).await.unwrap();

        let rows = store.override_rows(&TESSA);
        assert_eq!(rows[0].granted_by, ADMIN);
        assert!(rows[0].granted_at > 0);
    }

    #[tokio::test]
    async fn failed_insert_is_surfaced_not_swallowed() {
        let store = sample_store();
        let mut map = OverrideMap::new();
        map.apply("manage_media".into(), false, true);

        store.fail_next_insert();
        let result = store.replace_overrides(&TESSA, &map, &ADMIN).await;
        assert_eq!(result, Err(MemoryStoreError::InsertFailed));

        // Only the next call fails.
        store.replace_overrides(&TESSA, &map, &ADMIN).await.unwrap();
        assert_eq!(store.override_rows(&TESSA).len(), 1);
    }
}
