// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit log entries for staff and case mutations.
//!
//! Every successful mutation produces exactly one entry. Failed
//! transactional operations produce a `CaseCreationFailed` (or similar)
//! entry from their compensation path. Entries are immutable once built.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

#[cfg(test)]
mod tests;

use anarchy_domain::{GuildId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::OffsetDateTime;

/// The kind of change an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    StaffHired,
    StaffFired,
    StaffPromoted,
    StaffDemoted,
    CaseCreated,
    CaseAccepted,
    CaseDeclined,
    CaseClosed,
    CaseUpdated,
    LawyerAssigned,
    LawyerUnassigned,
    LeadAttorneyChanged,
    CaseCreationFailed,
    CaseOperationFailed,
    GuildOwnerBypass,
    ConfigChanged,
}

impl AuditAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::StaffHired,
        Self::StaffFired,
        Self::StaffPromoted,
        Self::StaffDemoted,
        Self::CaseCreated,
        Self::CaseAccepted,
        Self::CaseDeclined,
        Self::CaseClosed,
        Self::CaseUpdated,
        Self::LawyerAssigned,
        Self::LawyerUnassigned,
        Self::LeadAttorneyChanged,
        Self::CaseCreationFailed,
        Self::CaseOperationFailed,
        Self::GuildOwnerBypass,
        Self::ConfigChanged,
    ];

    /// The stored name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StaffHired => "staff_hired",
            Self::StaffFired => "staff_fired",
            Self::StaffPromoted => "staff_promoted",
            Self::StaffDemoted => "staff_demoted",
            Self::CaseCreated => "case_created",
            Self::CaseAccepted => "case_accepted",
            Self::CaseDeclined => "case_declined",
            Self::CaseClosed => "case_closed",
            Self::CaseUpdated => "case_updated",
            Self::LawyerAssigned => "lawyer_assigned",
            Self::LawyerUnassigned => "lawyer_unassigned",
            Self::LeadAttorneyChanged => "lead_attorney_changed",
            Self::CaseCreationFailed => "case_creation_failed",
            Self::CaseOperationFailed => "case_operation_failed",
            Self::GuildOwnerBypass => "guild_owner_bypass",
            Self::ConfigChanged => "config_changed",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Unknown audit action: {s}"))
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form context attached to an audit entry.
///
/// `before` and `after` hold short human-readable state descriptions
/// (for example a role name or a case status).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AuditDetails {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a state change from `before` to `after`.
    #[must_use]
    pub fn transition(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: Some(before.into()),
            after: Some(after.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// One immutable audit log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub guild_id: GuildId,
    pub action: AuditAction,
    /// The user who performed the action.
    pub actor_id: UserId,
    /// The affected entity: a user id for staff actions, a case id for case actions.
    pub target_id: Option<String>,
    pub details: AuditDetails,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AuditLogEntry {
    /// Creates an entry stamped with the current UTC time.
    #[must_use]
    pub fn new(
        guild_id: GuildId,
        action: AuditAction,
        actor_id: UserId,
        target_id: Option<String>,
        details: AuditDetails,
    ) -> Self {
        Self {
            guild_id,
            action,
            actor_id,
            target_id,
            details,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Overrides the timestamp, used when replaying stored entries.
    #[must_use]
    pub const fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}
