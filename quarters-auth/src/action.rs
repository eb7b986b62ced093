// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed commands against an edit session.
//!
//! UI layers map their interaction events (checkbox clicks, button presses) onto these actions
//! instead of wiring stringly-named handlers, keeping the engine fully decoupled from any
//! presentation technology.

use serde::{Deserialize, Serialize};

use crate::catalog::PermissionKey;
use crate::session::{EditSession, EngineError};
use crate::traits::{OverrideStore, SubjectId};

/// One admin interaction with a subject's permission table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action<ID> {
    /// Request a change to a permission's checked state.
    Toggle { key: PermissionKey, desired: bool },

    /// Persist the live override map, replacing the subject's stored set.
    Commit { actor: ID },

    /// Delete every override for the subject.
    Reset,
}

impl<ID> EditSession<ID>
where
    ID: SubjectId,
{
    /// Apply a single action to this session.
    ///
    /// `Toggle` only mutates in-memory state; `Commit` and `Reset` reach the store.
    pub async fn apply<S>(
        &mut self,
        store: &S,
        action: Action<ID>,
    ) -> Result<(), EngineError<S::Error>>
    where
        S: OverrideStore<ID>,
    {
        match action {
            Action::Toggle { key, desired } => Ok(self.toggle(&key, desired)?),
            Action::Commit { actor } => self.commit(store, &actor).await,
            Action::Reset => self.reset(store).await,
        }
    }
}
