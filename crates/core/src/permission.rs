// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Resolution of named permissions against a guild's configuration.

use crate::repository::{RepositoryError, SharedGuildConfigRepository};
use anarchy_domain::{GuildConfig, PermissionContext, PermissionName};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-permission results for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSummary {
    pub is_guild_owner: bool,
    pub is_admin: bool,
    /// Role-membership result for every permission name.
    pub permissions: BTreeMap<PermissionName, bool>,
}

/// Answers "may this member do X" from the guild's configured role mappings.
///
/// Resolution order: guild owner, admin users, admin roles, then the roles
/// mapped to the permission. Any storage failure denies.
pub struct PermissionService {
    guild_configs: SharedGuildConfigRepository,
}

impl PermissionService {
    #[must_use]
    pub fn new(guild_configs: SharedGuildConfigRepository) -> Self {
        Self { guild_configs }
    }

    pub fn has_action_permission(
        &self,
        context: &PermissionContext,
        permission: PermissionName,
    ) -> bool {
        if context.is_guild_owner {
            return true;
        }
        match self.load_config(context) {
            Ok(config) => {
                let granted: bool = is_config_admin(&config, context)
                    || context.has_any_role(config.roles_for(permission));
                debug!(
                    guild_id = %context.guild_id,
                    user_id = %context.user_id,
                    permission = %permission,
                    granted,
                    "Resolved permission"
                );
                granted
            }
            Err(err) => {
                warn!(
                    guild_id = %context.guild_id,
                    user_id = %context.user_id,
                    permission = %permission,
                    error = %err,
                    "Permission lookup failed, denying"
                );
                false
            }
        }
    }

    /// Guild owner, or the `admin` permission.
    pub fn is_admin(&self, context: &PermissionContext) -> bool {
        context.is_guild_owner || self.has_action_permission(context, PermissionName::Admin)
    }

    pub fn has_senior_staff_permission_with_context(&self, context: &PermissionContext) -> bool {
        self.has_action_permission(context, PermissionName::SeniorStaff)
    }

    /// Legacy name for [`Self::has_senior_staff_permission_with_context`].
    pub fn has_hr_permission_with_context(&self, context: &PermissionContext) -> bool {
        self.has_senior_staff_permission_with_context(context)
    }

    pub fn has_lawyer_permission_with_context(&self, context: &PermissionContext) -> bool {
        self.has_action_permission(context, PermissionName::Lawyer)
    }

    /// Legacy name for [`Self::has_lawyer_permission_with_context`].
    pub fn has_retainer_permission_with_context(&self, context: &PermissionContext) -> bool {
        self.has_lawyer_permission_with_context(context)
    }

    pub fn has_lead_attorney_permission_with_context(&self, context: &PermissionContext) -> bool {
        self.has_action_permission(context, PermissionName::LeadAttorney)
    }

    /// Evaluates every permission for display.
    ///
    /// Unlike [`Self::has_action_permission`] this does not short-circuit on
    /// admin status: each entry reflects actual role membership, except
    /// `admin` itself which mirrors [`Self::is_admin`]. A failed lookup
    /// reports everything as denied.
    pub fn get_permission_summary(&self, context: &PermissionContext) -> PermissionSummary {
        let config: Option<GuildConfig> = match self.load_config(context) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(
                    guild_id = %context.guild_id,
                    error = %err,
                    "Permission summary lookup failed"
                );
                None
            }
        };

        let is_admin: bool = context.is_guild_owner
            || config.as_ref().is_some_and(|config| {
                is_config_admin(config, context)
                    || context.has_any_role(config.roles_for(PermissionName::Admin))
            });

        let permissions: BTreeMap<PermissionName, bool> = PermissionName::ALL
            .into_iter()
            .map(|permission| {
                let granted: bool = if permission == PermissionName::Admin {
                    is_admin
                } else {
                    config.as_ref().is_some_and(|config| {
                        context.has_any_role(config.roles_for(permission))
                    })
                };
                (permission, granted)
            })
            .collect();

        PermissionSummary {
            is_guild_owner: context.is_guild_owner,
            is_admin,
            permissions,
        }
    }

    fn load_config(&self, context: &PermissionContext) -> Result<GuildConfig, RepositoryError> {
        self.guild_configs.ensure_guild_config(&context.guild_id)
    }
}

fn is_config_admin(config: &GuildConfig, context: &PermissionContext) -> bool {
    config.admin_users.contains(&context.user_id) || context.has_any_role(&config.admin_roles)
}
