// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::overrides::OverrideMap;

/// Immutable copy of a subject's override map, taken when an edit session opens and again after
/// every successful commit.
///
/// The snapshot purely gates whether the commit action is necessary; it never blocks in-memory
/// toggling.
#[derive(Clone, Debug)]
pub struct Snapshot(OverrideMap);

impl Snapshot {
    pub fn capture(overrides: &OverrideMap) -> Self {
        Self(overrides.clone())
    }

    /// Returns `true` when the current map differs from the snapshot: the sizes differ, a key is
    /// present on one side only, or a shared key's boolean differs.
    pub fn is_dirty(&self, current: &OverrideMap) -> bool {
        if self.0.len() != current.len() {
            return true;
        }

        current
            .iter()
            .any(|(key, granted)| self.0.get(key) != Some(granted))
    }
}
