// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Staff roles, their hiring caps, and staff records.
//!
//! Roles are strictly ordered. The numeric level of a role is what the
//! staff-membership checks compare against permission thresholds; the
//! guild's configurable role mapping is a separate mechanism used by the
//! permission service.

use crate::error::DomainError;
use crate::types::{GuildId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// The firm's staff hierarchy, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    ManagingPartner,
    SeniorPartner,
    JuniorPartner,
    SeniorAssociate,
    JuniorAssociate,
    Paralegal,
}

impl StaffRole {
    /// Every role, ordered from highest to lowest level.
    pub const ALL: [Self; 6] = [
        Self::ManagingPartner,
        Self::SeniorPartner,
        Self::JuniorPartner,
        Self::SeniorAssociate,
        Self::JuniorAssociate,
        Self::Paralegal,
    ];

    /// Returns the display name used in messages and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManagingPartner => "Managing Partner",
            Self::SeniorPartner => "Senior Partner",
            Self::JuniorPartner => "Junior Partner",
            Self::SeniorAssociate => "Senior Associate",
            Self::JuniorAssociate => "Junior Associate",
            Self::Paralegal => "Paralegal",
        }
    }

    /// Returns the role's permission level (1 = Paralegal, 6 = Managing Partner).
    ///
    /// Level 0 is reserved for "no staff role"; see [`staff_level`].
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::ManagingPartner => 6,
            Self::SeniorPartner => 5,
            Self::JuniorPartner => 4,
            Self::SeniorAssociate => 3,
            Self::JuniorAssociate => 2,
            Self::Paralegal => 1,
        }
    }

    /// Returns the maximum number of active staff members a guild may hold in this role.
    #[must_use]
    pub const fn max_count(&self) -> u32 {
        match self {
            Self::ManagingPartner => 1,
            Self::SeniorPartner => 3,
            Self::JuniorPartner => 5,
            Self::SeniorAssociate | Self::JuniorAssociate | Self::Paralegal => 10,
        }
    }
}

impl FromStr for StaffRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "managingpartner" => Ok(Self::ManagingPartner),
            "seniorpartner" => Ok(Self::SeniorPartner),
            "juniorpartner" => Ok(Self::JuniorPartner),
            "seniorassociate" => Ok(Self::SeniorAssociate),
            "juniorassociate" => Ok(Self::JuniorAssociate),
            "paralegal" => Ok(Self::Paralegal),
            _ => Err(DomainError::InvalidStaffRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission level of an optional role; `None` is level 0.
#[must_use]
pub const fn staff_level(role: Option<StaffRole>) -> u8 {
    match role {
        Some(role) => role.level(),
        None => 0,
    }
}

/// Employment status of a staff record. Firing is a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    Active,
    Terminated,
}

impl StaffStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }
}

impl FromStr for StaffStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "terminated" => Ok(Self::Terminated),
            _ => Err(DomainError::InvalidStaffStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff member of the firm within one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub role: StaffRole,
    pub status: StaffStatus,
    /// The user who hired this member.
    pub hired_by: UserId,
    pub hired_at: OffsetDateTime,
    /// The user who fired this member, if terminated.
    pub terminated_by: Option<UserId>,
    pub terminated_at: Option<OffsetDateTime>,
}

impl Staff {
    /// Creates a newly hired, active staff record.
    #[must_use]
    pub const fn hire(
        guild_id: GuildId,
        user_id: UserId,
        role: StaffRole,
        hired_by: UserId,
        hired_at: OffsetDateTime,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            role,
            status: StaffStatus::Active,
            hired_by,
            hired_at,
            terminated_by: None,
            terminated_at: None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, StaffStatus::Active)
    }
}
