// SPDX-License-Identifier: MIT OR Apache-2.0

//! Effective-permission resolution.
//!
//! The resolver composes a default source (the subject's role defaults) with the subject's
//! override map: the effective value for a key is the override when one is present, otherwise
//! whether the role defaults contain the key. Pure and deterministic, no I/O.

use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, CatalogError, PermissionKey};
use crate::overrides::OverrideMap;

/// Resolve the effective boolean for a single permission key.
///
/// Fails with [`CatalogError::UnknownPermission`] when the key is not part of the catalog.
/// Unknown keys are never silently defaulted.
pub fn resolve(
    catalog: &Catalog,
    defaults: &HashSet<PermissionKey>,
    overrides: &OverrideMap,
    key: &PermissionKey,
) -> Result<bool, CatalogError> {
    if !catalog.contains(key) {
        return Err(CatalogError::UnknownPermission(key.clone()));
    }

    Ok(overrides.get(key).unwrap_or(defaults.contains(key)))
}

/// Resolve the effective boolean for every key in the catalog, for bulk rendering.
///
/// Total by construction since it iterates the catalog itself.
pub fn resolve_all(
    catalog: &Catalog,
    defaults: &HashSet<PermissionKey>,
    overrides: &OverrideMap,
) -> HashMap<PermissionKey, bool> {
    catalog
        .permissions()
        .iter()
        .map(|permission| {
            let effective = overrides
                .get(&permission.key)
                .unwrap_or(defaults.contains(&permission.key));
            (permission.key.clone(), effective)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::catalog::{CatalogError, PermissionKey};
    use crate::overrides::OverrideMap;
    use crate::test_utils::{sample_catalog, sample_defaults};
    use crate::role::Role;

    use super::{resolve, resolve_all};

    #[test]
    fn override_takes_precedence_over_default() {
        let catalog = sample_catalog();
        let defaults = sample_defaults().remove(&Role::Staff).unwrap();
        let mut overrides = OverrideMap::new();

        let key = PermissionKey::from("manage_media");
        assert!(defaults.contains(&key));
        assert!(resolve(&catalog, &defaults, &overrides, &key).unwrap());

        overrides.apply(key.clone(), false, true);
        assert!(!resolve(&catalog, &defaults, &overrides, &key).unwrap());
    }

    #[test]
    fn absent_override_falls_back_to_role_default() {
        let catalog = sample_catalog();
        let defaults = sample_defaults().remove(&Role::Staff).unwrap();
        let overrides = OverrideMap::new();

        // Granted by the role.
        let granted = PermissionKey::from("manage_events");
        assert!(resolve(&catalog, &defaults, &overrides, &granted).unwrap());

        // Not granted by the role.
        let denied = PermissionKey::from("manage_accounting");
        assert!(!resolve(&catalog, &defaults, &overrides, &denied).unwrap());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let catalog = sample_catalog();
        let defaults = HashSet::new();
        let overrides = OverrideMap::new();

        let key = PermissionKey::from("manage_rockets");
        assert_eq!(
            resolve(&catalog, &defaults, &overrides, &key).err(),
            Some(CatalogError::UnknownPermission(key))
        );
    }

    #[test]
    fn resolve_all_covers_the_whole_catalog() {
        let catalog = sample_catalog();
        let defaults = sample_defaults().remove(&Role::Admin).unwrap();
        let overrides = OverrideMap::new();

        let effective = resolve_all(&catalog, &defaults, &overrides);
        assert_eq!(effective.len(), catalog.len());
        assert!(effective.values().all(|granted| *granted));
    }
}
