// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Command request and response data transfer objects.
//!
//! Requests carry slash-command options exactly as Discord delivers them:
//! identifiers and enum values are plain strings, parsed by the handlers.

use anarchy::PermissionSummary;
use anarchy_domain::{
    Case, CaseNote, GuildConfig, GuildId, PermissionContext, RoleId, Staff, UserId,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who invoked a command, where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub guild_id: String,
    pub user_id: String,
    /// Role ids the invoking member holds.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_guild_owner: bool,
}

impl InvocationContext {
    #[must_use]
    pub fn permission_context(&self) -> PermissionContext {
        PermissionContext::new(
            GuildId::new(&self.guild_id),
            UserId::new(&self.user_id),
            self.roles.iter().map(|role| RoleId::new(role)),
            self.is_guild_owner,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HireStaffRequest {
    pub user_id: String,
    /// Role display name, e.g. `Junior Associate`.
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireStaffRequest {
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Promotion or demotion to `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    /// The client's Discord username, used in the case number.
    pub client_username: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `medium`.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Accept a pending case as its lead attorney.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptCaseRequest {
    pub case_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineCaseRequest {
    pub case_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseCaseRequest {
    pub case_id: i64,
    /// One of `win`, `loss`, `settlement`, `dismissed`, `withdrawn`.
    pub result: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Assign, unassign, or make lead: one lawyer on one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLawyerRequest {
    pub case_id: i64,
    pub lawyer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignLawyerRequest {
    pub from_case_id: i64,
    pub to_case_id: i64,
    pub lawyer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNoteRequest {
    pub case_id: i64,
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePriorityRequest {
    pub case_id: i64,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCasesRequest {
    /// `pending`, `in-progress` or `closed`.
    pub status: String,
}

/// Replaces the guild's configuration. Omitted lists become empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGuildConfigRequest {
    #[serde(default)]
    pub admin_users: Vec<String>,
    #[serde(default)]
    pub admin_roles: Vec<String>,
    /// Role ids per permission name, e.g. `lawyer` or `senior-staff`.
    #[serde(default)]
    pub permissions: Vec<PermissionRolesInfo>,
    #[serde(default)]
    pub case_review_category_id: Option<String>,
    #[serde(default)]
    pub case_archive_category_id: Option<String>,
    #[serde(default)]
    pub feedback_channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRolesInfo {
    pub permission: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmBypassRequest {
    pub token: String,
}

/// A successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub result: T,
    /// Non-blocking validation warnings to show alongside the result.
    pub warnings: Vec<String>,
    pub message: String,
}

impl<T> CommandResponse<T> {
    pub fn new(result: T, warnings: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            result,
            warnings,
            message: message.into(),
        }
    }

    /// Converts the result, keeping warnings and message.
    pub fn map<U>(self, convert: impl FnOnce(T) -> U) -> CommandResponse<U> {
        CommandResponse {
            result: convert(self.result),
            warnings: self.warnings,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffInfo {
    pub user_id: String,
    pub role: String,
    pub status: String,
    pub hired_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub hired_at: OffsetDateTime,
    pub terminated_by: Option<String>,
}

impl From<&Staff> for StaffInfo {
    fn from(staff: &Staff) -> Self {
        Self {
            user_id: staff.user_id.to_string(),
            role: staff.role.to_string(),
            status: staff.status.to_string(),
            hired_by: staff.hired_by.to_string(),
            hired_at: staff.hired_at,
            terminated_by: staff.terminated_by.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInfo {
    pub content: String,
    pub created_by: String,
    pub is_internal: bool,
}

impl From<&CaseNote> for NoteInfo {
    fn from(note: &CaseNote) -> Self {
        Self {
            content: note.content.clone(),
            created_by: note.created_by.to_string(),
            is_internal: note.is_internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseInfo {
    pub case_id: i64,
    pub case_number: String,
    pub client_id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub assigned_lawyer_ids: Vec<String>,
    pub lead_attorney_id: Option<String>,
    pub notes: Vec<NoteInfo>,
    pub result: Option<String>,
    pub result_notes: Option<String>,
    pub channel_id: Option<String>,
}

impl From<&Case> for CaseInfo {
    fn from(case: &Case) -> Self {
        Self {
            case_id: case.id.value(),
            case_number: case.case_number.to_string(),
            client_id: case.client_id.to_string(),
            title: case.title.clone(),
            status: case.status.to_string(),
            priority: case.priority.to_string(),
            assigned_lawyer_ids: case
                .assigned_lawyer_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            lead_attorney_id: case.lead_attorney_id.as_ref().map(ToString::to_string),
            notes: case.notes.iter().map(NoteInfo::from).collect(),
            result: case.result.map(|result| result.to_string()),
            result_notes: case.result_notes.clone(),
            channel_id: case.channel_id.as_ref().map(ToString::to_string),
        }
    }
}

/// Both cases touched by a reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentInfo {
    pub from_case: CaseInfo,
    pub to_case: CaseInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfigInfo {
    pub guild_id: String,
    pub admin_users: Vec<String>,
    pub admin_roles: Vec<String>,
    pub permissions: Vec<PermissionRolesInfo>,
    pub case_review_category_id: Option<String>,
    pub case_archive_category_id: Option<String>,
    pub feedback_channel_id: Option<String>,
}

impl From<&GuildConfig> for GuildConfigInfo {
    fn from(config: &GuildConfig) -> Self {
        Self {
            guild_id: config.guild_id.to_string(),
            admin_users: config.admin_users.iter().map(ToString::to_string).collect(),
            admin_roles: config.admin_roles.iter().map(ToString::to_string).collect(),
            permissions: config
                .permissions
                .iter()
                .map(|(permission, roles)| PermissionRolesInfo {
                    permission: permission.to_string(),
                    roles: roles.iter().map(ToString::to_string).collect(),
                })
                .collect(),
            case_review_category_id: config
                .case_review_category_id
                .as_ref()
                .map(ToString::to_string),
            case_archive_category_id: config
                .case_archive_category_id
                .as_ref()
                .map(ToString::to_string),
            feedback_channel_id: config.feedback_channel_id.as_ref().map(ToString::to_string),
        }
    }
}

/// The result of a command re-run after the owner confirmed a bypass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConfirmedCommand {
    Staff(StaffInfo),
    Case(CaseInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSummaryInfo {
    pub is_guild_owner: bool,
    pub is_admin: bool,
    pub permissions: Vec<PermissionFlagInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFlagInfo {
    pub permission: String,
    pub granted: bool,
}

impl From<&PermissionSummary> for PermissionSummaryInfo {
    fn from(summary: &PermissionSummary) -> Self {
        Self {
            is_guild_owner: summary.is_guild_owner,
            is_admin: summary.is_admin,
            permissions: summary
                .permissions
                .iter()
                .map(|(permission, granted)| PermissionFlagInfo {
                    permission: permission.to_string(),
                    granted: *granted,
                })
                .collect(),
        }
    }
}
