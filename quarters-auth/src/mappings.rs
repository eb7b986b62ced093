// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::PermissionKey;
use crate::role::Role;
use crate::session::{EngineError, with_timeout};
use crate::traits::PolicyStore;

/// Cache for the key-to-granting-roles mapping used by audit/"included in" displays.
///
/// The mapping is a bulk read and changes rarely, so it is fetched once and reused until a caller
/// explicitly invalidates it. The cache is an ordinary value owned by whoever needs it, not
/// process-global state.
#[derive(Debug, Default)]
pub struct RoleMappingCache {
    cached: Option<HashMap<PermissionKey, Vec<Role>>>,
}

impl RoleMappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mapping, fetching it from the store on first use.
    pub async fn get_or_load<S>(
        &mut self,
        store: &S,
    ) -> Result<&HashMap<PermissionKey, Vec<Role>>, EngineError<S::Error>>
    where
        S: PolicyStore,
    {
        if self.cached.is_none() {
            let mappings = with_timeout(store.all_role_mappings()).await?;
            debug!(keys = mappings.len(), "loaded role mappings");
            self.cached = Some(mappings);
        }

        Ok(self
            .cached
            .as_ref()
            .expect("cache was filled directly above"))
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Drop the cached mapping so the next read fetches fresh data.
    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!("invalidated role mapping cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::PermissionKey;
    use crate::role::Role;
    use crate::test_utils::sample_store;

    use super::RoleMappingCache;

    #[tokio::test]
    async fn mapping_lists_granting_roles_in_order() {
        let store = sample_store();
        let mut cache = RoleMappingCache::new();

        let mappings = cache.get_or_load(&store).await.unwrap();
        let roles = &mappings[&PermissionKey::from("manage_media")];
        assert_eq!(roles, &vec![Role::Staff, Role::Admin, Role::Oracle]);

        // Admin-only permissions list the two top roles.
        let spaces = &mappings[&PermissionKey::from("manage_spaces")];
        assert_eq!(spaces, &vec![Role::Admin, Role::Oracle]);
    }

    #[tokio::test]
    async fn cache_serves_stale_data_until_invalidated() {
        let store = sample_store();
        let mut cache = RoleMappingCache::new();

        let before = cache.get_or_load(&store).await.unwrap().len();
        assert!(cache.is_cached());

        // The store gains a permission, but the cache keeps serving the old mapping.
        store.grant_default(Role::Oracle, "manage_rockets");
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), before);

        // Invalidation forces a refetch.
        cache.invalidate();
        assert!(!cache.is_cached());
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), before + 1);
    }
}
