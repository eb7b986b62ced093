// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The fixed set of roles a subject can hold within the suite. Roles are ordered by the breadth
/// of access they are typically granted, but permission resolution itself only ever consults the
/// role's default set, never this ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// External collaborator with minimal access.
    Associate,

    /// Subject living in one of the managed spaces.
    Resident,

    /// Demonstration account used for onboarding walkthroughs.
    Demo,

    /// Staff member administrating day-to-day operations.
    Staff,

    /// Administrator with access to all regular suite areas.
    Admin,

    /// Super-user able to manage other administrators.
    Oracle,
}

impl Role {
    /// All roles in ascending order.
    pub fn all() -> [Role; 6] {
        [
            Role::Associate,
            Role::Resident,
            Role::Demo,
            Role::Staff,
            Role::Admin,
            Role::Oracle,
        ]
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Associate => "associate",
            Role::Resident => "resident",
            Role::Demo => "demo",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::Oracle => "oracle",
        };

        write!(f, "{}", s)
    }
}
