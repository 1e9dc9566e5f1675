// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::audit_trail;
use crate::error::CoreError;
use crate::repository::{SharedAuditSink, SharedStaffRepository};
use anarchy_audit::{AuditAction, AuditDetails, AuditLogEntry};
use anarchy_domain::{DomainError, GuildId, Staff, StaffRole, StaffStatus, UserId};
use time::OffsetDateTime;
use tracing::info;

/// Hiring, firing and role changes.
///
/// Callers run the role-limit rule before calling in here; this service
/// only enforces record-level consistency.
pub struct StaffService {
    staff: SharedStaffRepository,
    audit: SharedAuditSink,
}

impl StaffService {
    #[must_use]
    pub fn new(staff: SharedStaffRepository, audit: SharedAuditSink) -> Self {
        Self { staff, audit }
    }

    /// Hires a user, reactivating their record if they were fired before.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is already active staff or storage fails.
    pub fn hire_staff(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        role: StaffRole,
        hired_by: &UserId,
    ) -> Result<Staff, CoreError> {
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let hired: Staff = match self.staff.find_by_user_id(guild_id, user_id)? {
            Some(existing) if existing.is_active() => return Err(CoreError::StaffAlreadyActive),
            Some(mut existing) => {
                existing.role = role;
                existing.status = StaffStatus::Active;
                existing.hired_by = hired_by.clone();
                existing.hired_at = now;
                existing.terminated_by = None;
                existing.terminated_at = None;
                self.staff
                    .update(&existing)?
                    .ok_or(CoreError::StaffNotFound)?
            }
            None => self.staff.add(&Staff::hire(
                guild_id.clone(),
                user_id.clone(),
                role,
                hired_by.clone(),
                now,
            ))?,
        };

        info!(guild_id = %guild_id, user_id = %user_id, role = %role, "Hired staff member");
        self.record(
            guild_id,
            AuditAction::StaffHired,
            hired_by,
            user_id,
            AuditDetails::new().with_metadata("role", role),
        );
        Ok(hired)
    }

    /// Soft-deletes an active staff member.
    ///
    /// # Errors
    ///
    /// Returns `StaffNotFound` if the user is not active staff.
    pub fn fire_staff(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        fired_by: &UserId,
        reason: Option<&str>,
    ) -> Result<Staff, CoreError> {
        let mut staff: Staff = self.find_active(guild_id, user_id)?;
        staff.status = StaffStatus::Terminated;
        staff.terminated_by = Some(fired_by.clone());
        staff.terminated_at = Some(OffsetDateTime::now_utc());
        let fired: Staff = self.staff.update(&staff)?.ok_or(CoreError::StaffNotFound)?;

        info!(guild_id = %guild_id, user_id = %user_id, "Fired staff member");
        let mut details: AuditDetails =
            AuditDetails::transition(StaffStatus::Active.as_str(), StaffStatus::Terminated.as_str())
                .with_metadata("role", fired.role);
        if let Some(reason) = reason {
            details = details.with_reason(reason);
        }
        self.record(guild_id, AuditAction::StaffFired, fired_by, user_id, details);
        Ok(fired)
    }

    /// Moves an active member to a strictly higher role.
    ///
    /// # Errors
    ///
    /// Returns an error if the member is not active or `new_role` is not higher.
    pub fn promote_staff(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        new_role: StaffRole,
        promoted_by: &UserId,
    ) -> Result<Staff, CoreError> {
        self.change_role(guild_id, user_id, new_role, promoted_by, RoleChange::Promotion)
    }

    /// Moves an active member to a strictly lower role.
    ///
    /// # Errors
    ///
    /// Returns an error if the member is not active or `new_role` is not lower.
    pub fn demote_staff(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        new_role: StaffRole,
        demoted_by: &UserId,
    ) -> Result<Staff, CoreError> {
        self.change_role(guild_id, user_id, new_role, demoted_by, RoleChange::Demotion)
    }

    /// Active staff in the guild.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn list_staff(&self, guild_id: &GuildId) -> Result<Vec<Staff>, CoreError> {
        Ok(self.staff.find_active_staff(guild_id)?)
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn get_staff(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Staff>, CoreError> {
        Ok(self.staff.find_by_user_id(guild_id, user_id)?)
    }

    fn change_role(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        new_role: StaffRole,
        actor_id: &UserId,
        change: RoleChange,
    ) -> Result<Staff, CoreError> {
        let mut staff: Staff = self.find_active(guild_id, user_id)?;
        let old_role: StaffRole = staff.role;
        let allowed: bool = match change {
            RoleChange::Promotion => new_role.level() > old_role.level(),
            RoleChange::Demotion => new_role.level() < old_role.level(),
        };
        if !allowed {
            return Err(DomainError::InvalidRoleChange {
                from: old_role.to_string(),
                to: new_role.to_string(),
                direction: change.as_str(),
            }
            .into());
        }

        staff.role = new_role;
        let updated: Staff = self.staff.update(&staff)?.ok_or(CoreError::StaffNotFound)?;

        info!(
            guild_id = %guild_id,
            user_id = %user_id,
            from = %old_role,
            to = %new_role,
            "Changed staff role"
        );
        let action: AuditAction = match change {
            RoleChange::Promotion => AuditAction::StaffPromoted,
            RoleChange::Demotion => AuditAction::StaffDemoted,
        };
        self.record(
            guild_id,
            action,
            actor_id,
            user_id,
            AuditDetails::transition(old_role.as_str(), new_role.as_str()),
        );
        Ok(updated)
    }

    fn find_active(&self, guild_id: &GuildId, user_id: &UserId) -> Result<Staff, CoreError> {
        self.staff
            .find_by_user_id(guild_id, user_id)?
            .filter(Staff::is_active)
            .ok_or(CoreError::StaffNotFound)
    }

    fn record(
        &self,
        guild_id: &GuildId,
        action: AuditAction,
        actor_id: &UserId,
        target_id: &UserId,
        details: AuditDetails,
    ) {
        let entry: AuditLogEntry = AuditLogEntry::new(
            guild_id.clone(),
            action,
            actor_id.clone(),
            Some(target_id.to_string()),
            details,
        );
        audit_trail::record(self.audit.as_ref(), &entry);
    }
}

#[derive(Debug, Clone, Copy)]
enum RoleChange {
    Promotion,
    Demotion,
}

impl RoleChange {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Promotion => "promotion",
            Self::Demotion => "demotion",
        }
    }
}
