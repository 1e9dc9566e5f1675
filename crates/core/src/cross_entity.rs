// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Referential checks that span more than one entity.
//!
//! These run before an operation and never mutate anything.

use crate::repository::{
    RepositoryError, SharedCaseRepository, SharedReminderRepository, SharedStaffRepository,
};
use anarchy_domain::{
    Case, CaseId, GuildId, PermissionName, Reminder, Staff, StaffRole, UserId, ValidationResult,
    staff_level,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Case,
    Staff,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Case => f.write_str("case"),
            Self::Staff => f.write_str("staff"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Close,
    Assign,
    Hire,
    Fire,
    Promote,
    Demote,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &str = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Close => "close",
            Self::Assign => "assign",
            Self::Hire => "hire",
            Self::Fire => "fire",
            Self::Promote => "promote",
            Self::Demote => "demote",
        };
        f.write_str(name)
    }
}

/// The identifiers an operation is about to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPayload {
    pub case_id: Option<CaseId>,
    pub user_id: Option<UserId>,
    pub new_role: Option<StaffRole>,
}

impl EntityPayload {
    #[must_use]
    pub fn for_case(case_id: CaseId) -> Self {
        Self {
            case_id: Some(case_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_staff(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn with_role(mut self, role: StaffRole) -> Self {
        self.new_role = Some(role);
        self
    }
}

pub struct CrossEntityValidationService {
    cases: SharedCaseRepository,
    staff: SharedStaffRepository,
    reminders: SharedReminderRepository,
}

impl CrossEntityValidationService {
    #[must_use]
    pub fn new(
        cases: SharedCaseRepository,
        staff: SharedStaffRepository,
        reminders: SharedReminderRepository,
    ) -> Self {
        Self {
            cases,
            staff,
            reminders,
        }
    }

    /// Validates the cross-entity constraints of `operation` on `entity_type`.
    ///
    /// Pairs without declared constraints are valid. Storage failures deny.
    pub fn validate_before_operation(
        &self,
        entity_type: EntityType,
        operation: Operation,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> ValidationResult {
        let checked: Result<ValidationResult, RepositoryError> = match (entity_type, operation) {
            (EntityType::Case, Operation::Close) => self.check_case_close(guild_id, payload),
            (EntityType::Case, Operation::Assign) => self.check_case_assign(guild_id, payload),
            (EntityType::Staff, Operation::Fire) => self.check_staff_fire(guild_id, payload),
            (EntityType::Staff, Operation::Demote) => self.check_staff_demote(guild_id, payload),
            _ => Ok(ValidationResult::success()),
        };

        match checked {
            Ok(result) => {
                debug!(
                    guild_id = %guild_id,
                    entity = %entity_type,
                    operation = %operation,
                    valid = result.valid,
                    "Cross-entity validation complete"
                );
                result
            }
            Err(err) => {
                warn!(
                    guild_id = %guild_id,
                    entity = %entity_type,
                    operation = %operation,
                    error = %err,
                    "Cross-entity validation failed"
                );
                ValidationResult::failure(format!(
                    "Failed to validate {entity_type} {operation}"
                ))
            }
        }
    }

    fn check_case_close(
        &self,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> Result<ValidationResult, RepositoryError> {
        let Some(case) = self.load_case(guild_id, payload)? else {
            return Ok(ValidationResult::failure("Case not found"));
        };

        let reminders: Vec<Reminder> = self.reminders.find_active_by_case(guild_id, case.id)?;
        if reminders.is_empty() {
            return Ok(ValidationResult::success());
        }
        Ok(ValidationResult::failure(format!(
            "Case has {} unresolved reminder(s) - resolve them before closing",
            reminders.len()
        ))
        .with_metadata("active_reminders", reminders.len()))
    }

    fn check_case_assign(
        &self,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> Result<ValidationResult, RepositoryError> {
        let Some(case) = self.load_case(guild_id, payload)? else {
            return Ok(ValidationResult::failure("Case not found"));
        };

        let mut result: ValidationResult = ValidationResult::success();
        if !case.status.is_open() {
            result.add_error("Cannot assign lawyers to a closed case");
        }

        let Some(lawyer_id) = &payload.user_id else {
            result.add_error("No lawyer specified");
            return Ok(result);
        };
        let role: Option<StaffRole> = self
            .staff
            .find_by_user_id(guild_id, lawyer_id)?
            .filter(Staff::is_active)
            .map(|staff| staff.role);
        match role {
            None => result.add_error("Lawyer is not an active staff member"),
            Some(role) if role.level() < PermissionName::Lawyer.required_staff_level() => {
                result.add_error(format!("A {role} cannot be assigned to cases"));
            }
            Some(_) => {}
        }
        Ok(result)
    }

    fn check_staff_fire(
        &self,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> Result<ValidationResult, RepositoryError> {
        let Some(user_id) = &payload.user_id else {
            return Ok(ValidationResult::failure("No staff member specified"));
        };

        let open_cases: Vec<Case> = self.open_cases_for(guild_id, user_id)?;
        let leading: usize = open_cases
            .iter()
            .filter(|case| case.is_lead_attorney(user_id))
            .count();

        let mut result: ValidationResult = ValidationResult::success();
        if leading > 0 {
            result.add_error(format!(
                "Staff member is lead attorney on {leading} open case(s) - reassign before firing"
            ));
        } else if !open_cases.is_empty() {
            result.add_warning(format!(
                "Staff member is assigned to {} open case(s)",
                open_cases.len()
            ));
        }
        Ok(result)
    }

    fn check_staff_demote(
        &self,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> Result<ValidationResult, RepositoryError> {
        let (Some(user_id), Some(new_role)) = (&payload.user_id, payload.new_role) else {
            return Ok(ValidationResult::failure(
                "No staff member or target role specified",
            ));
        };

        let mut result: ValidationResult = ValidationResult::success();
        if staff_level(Some(new_role)) >= PermissionName::LeadAttorney.required_staff_level() {
            return Ok(result);
        }
        let leading: usize = self
            .open_cases_for(guild_id, user_id)?
            .iter()
            .filter(|case| case.is_lead_attorney(user_id))
            .count();
        if leading > 0 {
            result.add_warning(format!(
                "{new_role} is below lead attorney level; staff member leads {leading} open case(s)"
            ));
        }
        Ok(result)
    }

    fn load_case(
        &self,
        guild_id: &GuildId,
        payload: &EntityPayload,
    ) -> Result<Option<Case>, RepositoryError> {
        let Some(case_id) = payload.case_id else {
            return Ok(None);
        };
        Ok(self
            .cases
            .find_by_id(case_id)?
            .filter(|case| &case.guild_id == guild_id))
    }

    fn open_cases_for(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Vec<Case>, RepositoryError> {
        Ok(self
            .cases
            .find_by_lawyer(guild_id, user_id)?
            .into_iter()
            .filter(|case| case.status.is_open())
            .collect())
    }
}
