// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pending guild-owner bypass confirmations.
//!
//! When a command fails only on rules the guild owner may override, the
//! command is parked here under a random token and the owner is shown a
//! confirmation prompt. Confirming consumes the token and re-runs the
//! command with the bypass accepted.
//!
//! Tokens are single-use, bound to the owner and guild that created them,
//! and expire after [`BYPASS_TOKEN_TTL`].

use anarchy_domain::{GuildId, PermissionContext, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::request_response::{AcceptCaseRequest, ChangeRoleRequest, HireStaffRequest};

/// How long an owner has to confirm a bypass.
pub const BYPASS_TOKEN_TTL: Duration = Duration::minutes(15);

/// A command waiting for the guild owner's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommand {
    HireStaff(HireStaffRequest),
    PromoteStaff(ChangeRoleRequest),
    DemoteStaff(ChangeRoleRequest),
    AcceptCase(AcceptCaseRequest),
}

impl PendingCommand {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HireStaff(_) => "hire_staff",
            Self::PromoteStaff(_) => "promote_staff",
            Self::DemoteStaff(_) => "demote_staff",
            Self::AcceptCase(_) => "accept_case",
        }
    }
}

#[derive(Debug)]
struct PendingBypass {
    guild_id: GuildId,
    owner_id: UserId,
    command: PendingCommand,
    expires_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct BypassRegistry {
    pending: Mutex<HashMap<String, PendingBypass>>,
}

impl BypassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `command` for the owner in `context` and returns its token.
    pub fn register(&self, context: &PermissionContext, command: PendingCommand) -> String {
        let token: String = new_token();
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let mut pending = self.lock();
        pending.retain(|_, entry| entry.expires_at > now);

        debug!(
            guild_id = %context.guild_id,
            user_id = %context.user_id,
            command = command.name(),
            "Registered bypass confirmation"
        );
        pending.insert(
            token.clone(),
            PendingBypass {
                guild_id: context.guild_id.clone(),
                owner_id: context.user_id.clone(),
                command,
                expires_at: now + BYPASS_TOKEN_TTL,
            },
        );
        token
    }

    /// Consumes `token` on behalf of the caller in `context`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown, used or expired tokens, and
    /// `Unauthorized` when the caller is not the owner who created the
    /// token. A refused caller does not consume the token.
    pub fn take(&self, token: &str, context: &PermissionContext) -> Result<PendingCommand, ApiError> {
        let mut pending = self.lock();
        let Some(entry) = pending.get(token) else {
            return Err(unknown_token());
        };

        if entry.expires_at <= OffsetDateTime::now_utc() {
            pending.remove(token);
            return Err(unknown_token());
        }
        if !context.is_guild_owner
            || entry.owner_id != context.user_id
            || entry.guild_id != context.guild_id
        {
            warn!(
                guild_id = %context.guild_id,
                user_id = %context.user_id,
                "Bypass confirmation attempted by someone other than its owner"
            );
            return Err(ApiError::Unauthorized {
                action: String::from("confirm_bypass"),
                message: String::from("Only the guild owner who started this command can confirm it"),
            });
        }

        pending
            .remove(token)
            .map(|entry| entry.command)
            .ok_or_else(unknown_token)
    }

    /// Number of unexpired confirmations waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        self.lock().values().filter(|entry| entry.expires_at > now).count()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingBypass>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unknown_token() -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Bypass request"),
        message: String::from("The confirmation has expired or was already used"),
    }
}

fn new_token() -> String {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}
