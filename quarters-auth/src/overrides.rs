// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PermissionKey;

/// The per-subject set of permission overrides. A key which is absent from the map inherits the
/// subject's role default.
///
/// The map is kept collapsed at all times: an entry exists if and only if its boolean contradicts
/// the role default for that key (see [`OverrideMap::apply`]). Values equal to the default are
/// never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideMap(HashMap<PermissionKey, bool>);

impl OverrideMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, key: &PermissionKey) -> Option<bool> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PermissionKey, bool)> {
        self.0.iter().map(|(key, granted)| (key, *granted))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Apply a requested change to a permission's checked state.
    ///
    /// This is the single rule behind the whole tri-state interaction: an override is written
    /// only if the requested boolean differs from the role default for that key, otherwise any
    /// existing override is deleted and the key falls back to the default.
    ///
    /// Returns `true` when the map changed.
    pub fn apply(&mut self, key: PermissionKey, desired: bool, default: bool) -> bool {
        if desired == default {
            self.0.remove(&key).is_some()
        } else {
            self.0.insert(key, desired) != Some(desired)
        }
    }
}

impl FromIterator<(PermissionKey, bool)> for OverrideMap {
    fn from_iter<T: IntoIterator<Item = (PermissionKey, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The interaction state of one permission's toggle, derived from the override map.
///
/// Because of the collapse rule only two of the three states are reachable for any given key:
/// `Auto` plus the forced state contradicting the role default. The forced state equal to the
/// default never materialises since it would collapse away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    /// No override; the key follows the role default.
    Auto,
    ForcedOn,
    ForcedOff,
}

impl ToggleState {
    pub fn from_override(value: Option<bool>) -> Self {
        match value {
            Some(true) => ToggleState::ForcedOn,
            Some(false) => ToggleState::ForcedOff,
            None => ToggleState::Auto,
        }
    }
}

/// A persisted override row, carrying who forced the value and when, for audit display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRow<ID> {
    pub key: PermissionKey,
    pub granted: bool,
    pub granted_by: ID,
    pub granted_at: u64,
}
