// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Generates a string-backed Discord snowflake identifier.
///
/// Snowflakes are carried as strings end to end; they are never parsed
/// into integers because nothing in the domain does arithmetic on them.
macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from its string form.
            #[must_use]
            pub fn new(value: &str) -> Self {
                Self(value.to_string())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// A Discord guild (server) identifier.
    GuildId
);
snowflake_id!(
    /// A Discord user identifier.
    UserId
);
snowflake_id!(
    /// A Discord role identifier.
    RoleId
);
snowflake_id!(
    /// A Discord channel or category identifier.
    ChannelId
);

/// Storage-assigned identifier of a case record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(i64);

impl CaseId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identifier of a reminder record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(i64);

impl ReminderId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// The caller of a command, as seen by permission checks.
///
/// Built once per interaction from the invoking member and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionContext {
    /// The guild the interaction happened in.
    pub guild_id: GuildId,
    /// The invoking user.
    pub user_id: UserId,
    /// Every role the invoking member holds.
    pub user_roles: HashSet<RoleId>,
    /// Whether the invoking user owns the guild.
    pub is_guild_owner: bool,
}

impl PermissionContext {
    /// Creates a new permission context.
    ///
    /// # Arguments
    ///
    /// * `guild_id` - The guild the interaction belongs to
    /// * `user_id` - The invoking user
    /// * `user_roles` - The roles held by the invoking member
    /// * `is_guild_owner` - Whether the invoking user owns the guild
    #[must_use]
    pub fn new(
        guild_id: GuildId,
        user_id: UserId,
        user_roles: impl IntoIterator<Item = RoleId>,
        is_guild_owner: bool,
    ) -> Self {
        Self {
            guild_id,
            user_id,
            user_roles: user_roles.into_iter().collect(),
            is_guild_owner,
        }
    }

    /// Returns true if the member holds at least one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|role| self.user_roles.contains(role))
    }
}
