// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A caller referenced a key which is not part of the catalog. This is a programming error on
    /// the caller's side and must never be silently defaulted.
    #[error("unknown permission key: {0}")]
    UnknownPermission(PermissionKey),

    #[error("duplicate permission key in catalog: {0}")]
    DuplicateKey(PermissionKey),

    #[error("permission {0} declares unknown parent key {1}")]
    UnknownDependent(PermissionKey, PermissionKey),
}

/// Stable identifier of a permission within the catalog.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionKey(String);

impl PermissionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PermissionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PermissionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for PermissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single permission definition.
///
/// Definitions are catalog-wide and never mutated at runtime. The optional `dependent_of`
/// relation marks a finer permission which is only meaningful alongside a coarser one; it is used
/// for display grouping only and carries no resolution semantics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub key: PermissionKey,
    pub label: String,
    pub description: String,
    pub category: String,
    pub dependent_of: Option<PermissionKey>,
}

/// Immutable definition of all permission keys known to the suite.
///
/// Built once per process or session from collaborator data. Construction validates that keys are
/// unique and that every `dependent_of` relation points at a key within the catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    permissions: Vec<Permission>,
    index: HashMap<PermissionKey, usize>,
}

impl Catalog {
    pub fn new(permissions: Vec<Permission>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(permissions.len());
        for (position, permission) in permissions.iter().enumerate() {
            if index.insert(permission.key.clone(), position).is_some() {
                return Err(CatalogError::DuplicateKey(permission.key.clone()));
            }
        }

        for permission in &permissions {
            if let Some(parent) = &permission.dependent_of {
                if !index.contains_key(parent) {
                    return Err(CatalogError::UnknownDependent(
                        permission.key.clone(),
                        parent.clone(),
                    ));
                }
            }
        }

        Ok(Self { permissions, index })
    }

    /// All permission definitions in their declared order.
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &PermissionKey) -> Result<&Permission, CatalogError> {
        self.index
            .get(key)
            .map(|position| &self.permissions[*position])
            .ok_or_else(|| CatalogError::UnknownPermission(key.clone()))
    }

    /// The coarser permission this key is displayed nested under, if any.
    pub fn dependent_of(&self, key: &PermissionKey) -> Result<Option<&PermissionKey>, CatalogError> {
        Ok(self.get(key)?.dependent_of.as_ref())
    }

    /// Permissions grouped by category, categories in first-seen order.
    pub fn categories(&self) -> Vec<(&str, Vec<&Permission>)> {
        let mut groups: Vec<(&str, Vec<&Permission>)> = Vec::new();
        for permission in &self.permissions {
            match groups
                .iter_mut()
                .find(|(category, _)| *category == permission.category)
            {
                Some((_, members)) => members.push(permission),
                None => groups.push((&permission.category, vec![permission])),
            }
        }
        groups
    }
}
