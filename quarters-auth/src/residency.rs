// SPDX-License-Identifier: MIT OR Apache-2.0

//! The residency flag: an auto-computed "is here now" boolean with a manual pin.
//!
//! Resolution follows the same contract as permission overrides: the effective value is the pin
//! when one is set, otherwise the value computed from the subject's assignment intervals. Unlike
//! the batch permission commit, every pin change persists immediately per click, with an
//! optimistic local apply that rolls back when the store rejects or times out.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::session::{EngineError, with_timeout};
use crate::traits::{FlagStore, SubjectId};

/// One assignment of a subject to a space. An interval without an end date is open-ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayInterval {
    pub starts_at: u64,
    pub ends_at: Option<u64>,
}

impl StayInterval {
    pub fn new(starts_at: u64, ends_at: Option<u64>) -> Self {
        Self { starts_at, ends_at }
    }

    pub fn covers(&self, today: u64) -> bool {
        today >= self.starts_at && self.ends_at.is_none_or(|ends_at| today <= ends_at)
    }
}

/// Pure derivation of the computed residency value: `true` iff some interval covers `today`.
pub fn compute_auto(intervals: &[StayInterval], today: u64) -> bool {
    intervals.iter().any(|interval| interval.covers(today))
}

/// A subject's residency flag as resolved at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyState {
    pub computed: bool,
    pub pinned: Option<bool>,
}

impl ResidencyState {
    /// The value actually enforced: the pin when set, otherwise the computed value.
    pub fn effective(&self) -> bool {
        self.pinned.unwrap_or(self.computed)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// The pin a click would move to. Only one forced slot is remembered, so the cycle has two
    /// steps: unpinned forces the opposite of the currently displayed value, pinned clears back
    /// to the computed value.
    pub fn next_pin(&self) -> Option<bool> {
        match self.pinned {
            Some(_) => None,
            None => Some(!self.computed),
        }
    }
}

/// Load a subject's residency state: the pin from the store, the computed value derived from the
/// given intervals.
pub async fn load_residency<ID, S>(
    store: &S,
    subject: &ID,
    intervals: &[StayInterval],
    today: u64,
) -> Result<ResidencyState, EngineError<S::Error>>
where
    ID: SubjectId,
    S: FlagStore<ID>,
{
    let pinned = with_timeout(store.pinned_flag(subject)).await?;
    Ok(ResidencyState {
        computed: compute_auto(intervals, today),
        pinned,
    })
}

/// Advance the pin cycle by one click and persist it immediately.
///
/// The new pin is applied optimistically before the store call; on failure or timeout the state
/// rolls back to the last confirmed value and the error is surfaced to the caller. Returns the
/// new effective value on success.
pub async fn cycle_residency<ID, S>(
    store: &S,
    subject: &ID,
    state: &mut ResidencyState,
) -> Result<bool, EngineError<S::Error>>
where
    ID: SubjectId,
    S: FlagStore<ID>,
{
    let confirmed = state.pinned;
    let next = state.next_pin();
    state.pinned = next;

    match with_timeout(store.set_pinned_flag(subject, next)).await {
        Ok(()) => {
            debug!(subject = ?subject, pinned = ?next, "residency pin persisted");
            Ok(state.effective())
        }
        Err(error) => {
            state.pinned = confirmed;
            warn!(subject = ?subject, "residency pin rejected by store, rolled back");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::EngineError;
    use crate::test_utils::{StalledStore, sample_store};
    use crate::traits::FlagStore;

    use super::{ResidencyState, StayInterval, compute_auto, cycle_residency, load_residency};

    const REMY: char = 'R';

    // Unix seconds for 2024-01-01 and some later day.
    const JAN_2024: u64 = 1_704_067_200;
    const LATER: u64 = 1_719_792_000;

    #[test]
    fn open_ended_interval_covers_any_later_day() {
        let interval = StayInterval::new(JAN_2024, None);
        assert!(interval.covers(JAN_2024));
        assert!(interval.covers(LATER));
        assert!(!interval.covers(JAN_2024 - 1));
    }

    #[test]
    fn ended_interval_stops_covering() {
        let intervals = [StayInterval::new(0, Some(JAN_2024))];
        assert!(compute_auto(&intervals, JAN_2024));
        assert!(!compute_auto(&intervals, LATER));
        assert!(!compute_auto(&[], LATER));
    }

    #[tokio::test]
    async fn pin_cycle_forces_then_clears() {
        let store = sample_store();
        store.set_intervals(REMY, vec![StayInterval::new(0, Some(JAN_2024))]);

        // The only interval has ended, so the computed value is false.
        let mut state = load_residency(&store, &REMY, &[StayInterval::new(0, Some(JAN_2024))], LATER)
            .await
            .unwrap();
        assert!(!state.effective());
        assert!(!state.is_pinned());

        // First click pins the opposite of the displayed value.
        let effective = cycle_residency(&store, &REMY, &mut state).await.unwrap();
        assert!(effective);
        assert_eq!(state.pinned, Some(true));
        assert_eq!(store.pinned_flag(&REMY).await.unwrap(), Some(true));

        // Second click clears the pin back to the computed value.
        let effective = cycle_residency(&store, &REMY, &mut state).await.unwrap();
        assert!(!effective);
        assert_eq!(state.pinned, None);
        assert_eq!(store.pinned_flag(&REMY).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pin_rolls_back_to_confirmed_value() {
        let stalled = StalledStore;
        let mut state = ResidencyState {
            computed: false,
            pinned: None,
        };

        let result = cycle_residency(&stalled, &REMY, &mut state).await;
        assert!(matches!(result, Err(EngineError::Timeout(_))));

        // The optimistic pin was rolled back.
        assert_eq!(state.pinned, None);
        assert!(!state.effective());
    }

    #[tokio::test]
    async fn recompute_updates_computed_but_never_pins() {
        let store = sample_store();
        let pinned_subject = 'P';
        let free_subject = 'F';

        // Both subjects start with no assignment, one of them pinned to true.
        store.set_intervals(pinned_subject, vec![]);
        store.set_intervals(free_subject, vec![]);
        store
            .set_pinned_flag(&pinned_subject, Some(true))
            .await
            .unwrap();
        store.recompute_all_flags(LATER).await.unwrap();
        assert!(!store.computed_flag(&free_subject));

        // New assignment data arrives for both.
        store.set_intervals(free_subject, vec![StayInterval::new(JAN_2024, None)]);
        store.set_intervals(pinned_subject, vec![StayInterval::new(JAN_2024, None)]);
        let changed = store.recompute_all_flags(LATER).await.unwrap();
        assert_eq!(changed, 2);

        // Computed values reflect the new intervals; the pin is untouched.
        assert!(store.computed_flag(&free_subject));
        assert!(store.computed_flag(&pinned_subject));
        assert_eq!(store.pinned_flag(&pinned_subject).await.unwrap(), Some(true));

        // Running it again is a no-op.
        let changed = store.recompute_all_flags(LATER).await.unwrap();
        assert_eq!(changed, 0);
    }
}
