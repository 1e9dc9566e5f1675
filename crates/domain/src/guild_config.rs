// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{ChannelId, GuildId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A named capability a guild maps onto Discord roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionName {
    Admin,
    SeniorStaff,
    Lawyer,
    LeadAttorney,
    Case,
    Config,
    Repair,
}

impl PermissionName {
    /// Every known permission, in display order.
    pub const ALL: [Self; 7] = [
        Self::Admin,
        Self::SeniorStaff,
        Self::Lawyer,
        Self::LeadAttorney,
        Self::Case,
        Self::Config,
        Self::Repair,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SeniorStaff => "senior-staff",
            Self::Lawyer => "lawyer",
            Self::LeadAttorney => "lead-attorney",
            Self::Case => "case",
            Self::Config => "config",
            Self::Repair => "repair",
        }
    }

    /// Minimum staff role level that satisfies this permission in staff-membership checks.
    #[must_use]
    pub const fn required_staff_level(&self) -> u8 {
        match self {
            Self::Admin | Self::Config | Self::Repair => 6,
            Self::SeniorStaff => 5,
            Self::LeadAttorney => 3,
            Self::Lawyer | Self::Case => 2,
        }
    }
}

impl FromStr for PermissionName {
    type Err = DomainError;

    /// Parses a permission name, accepting the legacy `hr` and `retainer` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "senior-staff" | "hr" => Ok(Self::SeniorStaff),
            "lawyer" | "retainer" => Ok(Self::Lawyer),
            "lead-attorney" => Ok(Self::LeadAttorney),
            "case" => Ok(Self::Case),
            "config" => Ok(Self::Config),
            "repair" => Ok(Self::Repair),
            _ => Err(DomainError::InvalidPermission(s.to_string())),
        }
    }
}

impl std::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-guild configuration: permission role mappings, admins, and categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: GuildId,
    /// Users with full admin rights regardless of roles.
    pub admin_users: Vec<UserId>,
    /// Roles with full admin rights.
    pub admin_roles: Vec<RoleId>,
    /// Roles granting each named permission.
    pub permissions: BTreeMap<PermissionName, Vec<RoleId>>,
    /// Category new case channels are created under.
    pub case_review_category_id: Option<ChannelId>,
    /// Category closed case channels are moved to.
    pub case_archive_category_id: Option<ChannelId>,
    pub feedback_channel_id: Option<ChannelId>,
}

impl GuildConfig {
    /// Creates the empty configuration a guild starts with.
    #[must_use]
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            admin_users: Vec::new(),
            admin_roles: Vec::new(),
            permissions: BTreeMap::new(),
            case_review_category_id: None,
            case_archive_category_id: None,
            feedback_channel_id: None,
        }
    }

    /// Roles mapped to `permission`, empty if none are configured.
    #[must_use]
    pub fn roles_for(&self, permission: PermissionName) -> &[RoleId] {
        self.permissions
            .get(&permission)
            .map_or(&[], Vec::as_slice)
    }

    /// Adds `role` to the roles granting `permission`, ignoring duplicates.
    pub fn grant(&mut self, permission: PermissionName, role: RoleId) {
        let roles: &mut Vec<RoleId> = self.permissions.entry(permission).or_default();
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    /// Removes `role` from the roles granting `permission`.
    pub fn revoke(&mut self, permission: PermissionName, role: &RoleId) {
        if let Some(roles) = self.permissions.get_mut(&permission) {
            roles.retain(|existing| existing != role);
        }
    }
}
