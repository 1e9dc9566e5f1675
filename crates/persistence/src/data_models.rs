// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their mapping onto domain values.
//!
//! Timestamps are stored as RFC 3339 text. List-valued case fields and the
//! guild permission map are stored as JSON text.

use anarchy_audit::{AuditAction, AuditDetails, AuditLogEntry};
use anarchy_domain::{
    Case, CaseDocument, CaseId, CaseNote, CaseNumber, CasePriority, CaseResult, CaseStatus,
    ChannelId, GuildConfig, GuildId, PermissionName, Reminder, ReminderId, RoleId, Staff,
    StaffRole, StaffStatus, UserId,
};
use diesel::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::{audit_log, cases, guild_configs, reminders, staff};
use crate::error::PersistenceError;

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, PersistenceError> {
    timestamp
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn parse_timestamp(column: &str, value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::CorruptRow(format!("{column} '{value}': {e}")))
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, PersistenceError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| PersistenceError::CorruptRow(format!("{column} '{value}': {e}")))
}

fn optional_timestamp(
    column: &str,
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(|value| parse_timestamp(column, value)).transpose()
}

fn optional_timestamp_text(
    timestamp: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    timestamp.map(format_timestamp).transpose()
}

// ============================================================================
// Staff
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StaffRow {
    pub staff_id: i64,
    pub guild_id: String,
    pub user_id: String,
    pub role: String,
    pub status: String,
    pub hired_by: String,
    pub hired_at: String,
    pub terminated_by: Option<String>,
    pub terminated_at: Option<String>,
}

impl StaffRow {
    /// # Errors
    ///
    /// Returns an error if a stored value does not parse.
    pub fn into_domain(self) -> Result<Staff, PersistenceError> {
        Ok(Staff {
            user_id: UserId::from(self.user_id),
            guild_id: GuildId::from(self.guild_id),
            role: parse_column::<StaffRole>("staff.role", &self.role)?,
            status: parse_column::<StaffStatus>("staff.status", &self.status)?,
            hired_by: UserId::from(self.hired_by),
            hired_at: parse_timestamp("staff.hired_at", &self.hired_at)?,
            terminated_by: self.terminated_by.map(UserId::from),
            terminated_at: optional_timestamp(
                "staff.terminated_at",
                self.terminated_at.as_deref(),
            )?,
        })
    }
}

/// Column values written for a staff member, on insert and on update.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = staff)]
#[diesel(treat_none_as_null = true)]
pub struct StaffRecord<'a> {
    pub guild_id: &'a str,
    pub user_id: &'a str,
    pub role: &'static str,
    pub status: &'static str,
    pub hired_by: &'a str,
    pub hired_at: String,
    pub terminated_by: Option<&'a str>,
    pub terminated_at: Option<String>,
}

impl<'a> StaffRecord<'a> {
    /// # Errors
    ///
    /// Returns an error if a timestamp cannot be formatted.
    pub fn from_domain(member: &'a Staff) -> Result<Self, PersistenceError> {
        Ok(Self {
            guild_id: member.guild_id.as_str(),
            user_id: member.user_id.as_str(),
            role: member.role.as_str(),
            status: member.status.as_str(),
            hired_by: member.hired_by.as_str(),
            hired_at: format_timestamp(member.hired_at)?,
            terminated_by: member.terminated_by.as_ref().map(UserId::as_str),
            terminated_at: optional_timestamp_text(member.terminated_at)?,
        })
    }
}

// ============================================================================
// Cases
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = cases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CaseRow {
    pub case_id: i64,
    pub guild_id: String,
    pub case_number: String,
    pub client_id: String,
    pub client_username: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assigned_lawyer_ids: String,
    pub lead_attorney_id: Option<String>,
    pub documents: String,
    pub notes: String,
    pub result: Option<String>,
    pub result_notes: Option<String>,
    pub closed_by: Option<String>,
    pub closed_at: Option<String>,
    pub channel_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CaseRow {
    /// # Errors
    ///
    /// Returns an error if a stored value does not parse.
    pub fn into_domain(self) -> Result<Case, PersistenceError> {
        let assigned_lawyer_ids: Vec<UserId> = serde_json::from_str(&self.assigned_lawyer_ids)?;
        let documents: Vec<CaseDocument> = serde_json::from_str(&self.documents)?;
        let notes: Vec<CaseNote> = serde_json::from_str(&self.notes)?;
        let result: Option<CaseResult> = self
            .result
            .as_deref()
            .map(|value| parse_column::<CaseResult>("cases.result", value))
            .transpose()?;

        Ok(Case {
            id: CaseId::new(self.case_id),
            guild_id: GuildId::from(self.guild_id),
            case_number: CaseNumber::from_stored(self.case_number),
            client_id: UserId::from(self.client_id),
            client_username: self.client_username,
            title: self.title,
            description: self.description,
            status: parse_column::<CaseStatus>("cases.status", &self.status)?,
            priority: parse_column::<CasePriority>("cases.priority", &self.priority)?,
            assigned_lawyer_ids,
            lead_attorney_id: self.lead_attorney_id.map(UserId::from),
            documents,
            notes,
            result,
            result_notes: self.result_notes,
            closed_by: self.closed_by.map(UserId::from),
            closed_at: optional_timestamp("cases.closed_at", self.closed_at.as_deref())?,
            channel_id: self.channel_id.map(ChannelId::from),
            created_at: parse_timestamp("cases.created_at", &self.created_at)?,
            updated_at: parse_timestamp("cases.updated_at", &self.updated_at)?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cases)]
pub struct NewCaseRecord<'a> {
    pub guild_id: &'a str,
    pub case_number: &'a str,
    pub client_id: &'a str,
    pub client_username: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub status: &'static str,
    pub priority: &'static str,
    pub created_at: String,
    pub updated_at: String,
}

/// The case columns an ordinary edit may touch. Status and the closing
/// fields are left to [`CaseLifecycleChanges`], and the case number,
/// client and creation time never change after insert.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = cases)]
#[diesel(treat_none_as_null = true)]
pub struct CaseChanges<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub priority: &'static str,
    pub assigned_lawyer_ids: String,
    pub lead_attorney_id: Option<&'a str>,
    pub documents: String,
    pub notes: String,
    pub channel_id: Option<&'a str>,
    pub updated_at: String,
}

impl<'a> CaseChanges<'a> {
    /// # Errors
    ///
    /// Returns an error if a list field or timestamp cannot be serialized.
    pub fn from_domain(case: &'a Case) -> Result<Self, PersistenceError> {
        Ok(Self {
            title: &case.title,
            description: &case.description,
            priority: case.priority.as_str(),
            assigned_lawyer_ids: serde_json::to_string(&case.assigned_lawyer_ids)?,
            lead_attorney_id: case.lead_attorney_id.as_ref().map(UserId::as_str),
            documents: serde_json::to_string(&case.documents)?,
            notes: serde_json::to_string(&case.notes)?,
            channel_id: case.channel_id.as_ref().map(ChannelId::as_str),
            updated_at: format_timestamp(case.updated_at)?,
        })
    }
}

/// Status and closing columns, written only by a status transition.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = cases)]
#[diesel(treat_none_as_null = true)]
pub struct CaseLifecycleChanges<'a> {
    pub status: &'static str,
    pub result: Option<&'static str>,
    pub result_notes: Option<&'a str>,
    pub closed_by: Option<&'a str>,
    pub closed_at: Option<String>,
}

impl<'a> CaseLifecycleChanges<'a> {
    /// # Errors
    ///
    /// Returns an error if the closing timestamp cannot be formatted.
    pub fn from_domain(case: &'a Case) -> Result<Self, PersistenceError> {
        Ok(Self {
            status: case.status.as_str(),
            result: case.result.as_ref().map(CaseResult::as_str),
            result_notes: case.result_notes.as_deref(),
            closed_by: case.closed_by.as_ref().map(UserId::as_str),
            closed_at: optional_timestamp_text(case.closed_at)?,
        })
    }
}

// ============================================================================
// Guild configuration
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = guild_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GuildConfigRow {
    pub guild_id: String,
    pub admin_users: String,
    pub admin_roles: String,
    pub permissions: String,
    pub case_review_category_id: Option<String>,
    pub case_archive_category_id: Option<String>,
    pub feedback_channel_id: Option<String>,
}

impl GuildConfigRow {
    /// # Errors
    ///
    /// Returns an error if a JSON column does not parse.
    pub fn into_domain(self) -> Result<GuildConfig, PersistenceError> {
        let permissions: BTreeMap<PermissionName, Vec<RoleId>> =
            serde_json::from_str(&self.permissions)?;
        Ok(GuildConfig {
            guild_id: GuildId::from(self.guild_id),
            admin_users: serde_json::from_str(&self.admin_users)?,
            admin_roles: serde_json::from_str(&self.admin_roles)?,
            permissions,
            case_review_category_id: self.case_review_category_id.map(ChannelId::from),
            case_archive_category_id: self.case_archive_category_id.map(ChannelId::from),
            feedback_channel_id: self.feedback_channel_id.map(ChannelId::from),
        })
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = guild_configs)]
#[diesel(treat_none_as_null = true)]
pub struct GuildConfigChanges<'a> {
    pub admin_users: String,
    pub admin_roles: String,
    pub permissions: String,
    pub case_review_category_id: Option<&'a str>,
    pub case_archive_category_id: Option<&'a str>,
    pub feedback_channel_id: Option<&'a str>,
    pub updated_at: String,
}

impl<'a> GuildConfigChanges<'a> {
    /// # Errors
    ///
    /// Returns an error if a field cannot be serialized.
    pub fn from_domain(
        config: &'a GuildConfig,
        updated_at: OffsetDateTime,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            admin_users: serde_json::to_string(&config.admin_users)?,
            admin_roles: serde_json::to_string(&config.admin_roles)?,
            permissions: serde_json::to_string(&config.permissions)?,
            case_review_category_id: config.case_review_category_id.as_ref().map(ChannelId::as_str),
            case_archive_category_id: config
                .case_archive_category_id
                .as_ref()
                .map(ChannelId::as_str),
            feedback_channel_id: config.feedback_channel_id.as_ref().map(ChannelId::as_str),
            updated_at: format_timestamp(updated_at)?,
        })
    }
}

// ============================================================================
// Reminders
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = reminders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReminderRow {
    pub reminder_id: i64,
    pub guild_id: String,
    pub user_id: String,
    pub case_id: Option<i64>,
    pub message: String,
    pub scheduled_for: String,
    pub is_active: i32,
}

impl ReminderRow {
    /// # Errors
    ///
    /// Returns an error if the schedule time does not parse.
    pub fn into_domain(self) -> Result<Reminder, PersistenceError> {
        Ok(Reminder {
            id: ReminderId::new(self.reminder_id),
            guild_id: GuildId::from(self.guild_id),
            user_id: UserId::from(self.user_id),
            case_id: self.case_id.map(CaseId::new),
            message: self.message,
            scheduled_for: parse_timestamp("reminders.scheduled_for", &self.scheduled_for)?,
            is_active: self.is_active != 0,
        })
    }
}

// ============================================================================
// Audit log
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = audit_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditLogRow {
    pub audit_id: i64,
    pub guild_id: String,
    pub action: String,
    pub actor_id: String,
    pub target_id: Option<String>,
    pub details_json: String,
    pub created_at: String,
}

impl AuditLogRow {
    /// # Errors
    ///
    /// Returns an error if the action, details or timestamp do not parse.
    pub fn into_domain(self) -> Result<AuditLogEntry, PersistenceError> {
        let details: AuditDetails = serde_json::from_str(&self.details_json)?;
        Ok(AuditLogEntry {
            guild_id: GuildId::from(self.guild_id),
            action: parse_column::<AuditAction>("audit_log.action", &self.action)?,
            actor_id: UserId::from(self.actor_id),
            target_id: self.target_id,
            details,
            timestamp: parse_timestamp("audit_log.created_at", &self.created_at)?,
        })
    }
}
