// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Firm business rules: hiring caps, client case limits, staff membership
//! and permission checks.
//!
//! Every check returns a typed validation result and never an error. Storage
//! failures are turned into failing results so that a broken lookup can
//! never be mistaken for an allowed action.

use crate::permission::PermissionService;
use crate::repository::{SharedCaseRepository, SharedStaffRepository};
use anarchy_domain::{
    BypassType, CLIENT_CASE_LIMIT, CLIENT_CASE_WARNING_THRESHOLD, Case, ClientCaseLimitValidation,
    GuildId, PermissionContext, PermissionName, PermissionValidation, RoleLimitValidation, Staff,
    StaffRole, StaffValidation, UserId, ValidationResult, staff_level,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct BusinessRuleValidationService {
    staff: SharedStaffRepository,
    cases: SharedCaseRepository,
    permissions: Arc<PermissionService>,
}

impl BusinessRuleValidationService {
    #[must_use]
    pub fn new(
        staff: SharedStaffRepository,
        cases: SharedCaseRepository,
        permissions: Arc<PermissionService>,
    ) -> Self {
        Self {
            staff,
            cases,
            permissions,
        }
    }

    /// Checks whether one more member may be hired into `role`.
    ///
    /// A guild owner is offered a bypass when the cap is reached; the
    /// reported counts are never adjusted.
    pub fn validate_role_limit(
        &self,
        context: &PermissionContext,
        role: StaffRole,
    ) -> RoleLimitValidation {
        let current_count: u32 = match self
            .staff
            .get_staff_count_by_role(&context.guild_id, role)
        {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    guild_id = %context.guild_id,
                    role = %role,
                    error = %err,
                    "Role limit lookup failed"
                );
                return RoleLimitValidation {
                    result: ValidationResult::failure("Failed to validate role limits"),
                    role,
                    current_count: 0,
                    max_count: 0,
                };
            }
        };
        let max_count: u32 = role.max_count();

        let mut result: ValidationResult = ValidationResult::success()
            .with_metadata("current_count", current_count)
            .with_metadata("max_count", max_count);
        if current_count >= max_count {
            result.add_error(format!(
                "Maximum limit reached for {role}: {current_count}/{max_count}"
            ));
            if context.is_guild_owner {
                result = result.with_bypass(BypassType::GuildOwner);
            }
        }

        debug!(
            guild_id = %context.guild_id,
            role = %role,
            current_count,
            max_count,
            valid = result.valid,
            "Validated role limit"
        );
        RoleLimitValidation {
            result,
            role,
            current_count,
            max_count,
        }
    }

    /// Checks a client's open case load within one guild.
    ///
    /// Only pending and in-progress cases in `guild_id` count. The limit
    /// applies to everyone, so no bypass is ever offered.
    pub fn validate_client_case_limit(
        &self,
        client_id: &UserId,
        guild_id: &GuildId,
    ) -> ClientCaseLimitValidation {
        let max_count: u32 = CLIENT_CASE_LIMIT;
        let cases: Vec<Case> = match self.cases.find_by_client(client_id) {
            Ok(cases) => cases,
            Err(err) => {
                warn!(
                    guild_id = %guild_id,
                    client_id = %client_id,
                    error = %err,
                    "Client case lookup failed"
                );
                return ClientCaseLimitValidation {
                    result: ValidationResult::failure("Failed to validate client case limit"),
                    client_id: client_id.clone(),
                    current_count: 0,
                    max_count,
                };
            }
        };

        let open_cases: usize = cases
            .iter()
            .filter(|case| &case.guild_id == guild_id && case.status.is_open())
            .count();
        let current_count: u32 = u32::try_from(open_cases).unwrap_or(u32::MAX);

        let mut result: ValidationResult = ValidationResult::success()
            .with_metadata("current_count", current_count)
            .with_metadata("max_count", max_count);
        if current_count >= max_count {
            result.add_error(format!(
                "Client has reached the maximum limit of {max_count} active cases"
            ));
        } else if current_count >= CLIENT_CASE_WARNING_THRESHOLD {
            result.add_warning(format!(
                "Client has {current_count} active cases (approaching limit of {max_count})"
            ));
        }

        ClientCaseLimitValidation {
            result,
            client_id: client_id.clone(),
            current_count,
            max_count,
        }
    }

    /// Checks that `user_id` is active staff whose role level meets every
    /// required permission's threshold.
    ///
    /// This uses the fixed role-level table, not the guild's permission
    /// role mappings. Unknown permission names always count as missing.
    pub fn validate_staff_member(
        &self,
        context: &PermissionContext,
        user_id: &UserId,
        required_permissions: &[&str],
    ) -> StaffValidation {
        let staff: Option<Staff> = match self.staff.find_by_user_id(&context.guild_id, user_id) {
            Ok(staff) => staff,
            Err(err) => {
                warn!(
                    guild_id = %context.guild_id,
                    user_id = %user_id,
                    error = %err,
                    "Staff lookup failed"
                );
                let mut result: ValidationResult =
                    ValidationResult::failure("Failed to validate staff member");
                if context.is_guild_owner {
                    result = result.with_bypass(BypassType::GuildOwner);
                }
                return StaffValidation {
                    result,
                    is_active_staff: false,
                    current_role: None,
                    has_required_permissions: false,
                };
            }
        };

        let current_role: Option<StaffRole> = staff
            .filter(Staff::is_active)
            .map(|staff| staff.role);
        let is_active_staff: bool = current_role.is_some();
        let level: u8 = staff_level(current_role);

        let missing: Vec<&str> = required_permissions
            .iter()
            .copied()
            .filter(|name| {
                !name
                    .parse::<PermissionName>()
                    .is_ok_and(|permission| level >= permission.required_staff_level())
            })
            .collect();
        let has_required_permissions: bool = missing.is_empty();

        let mut result: ValidationResult = ValidationResult::success();
        if !is_active_staff {
            result.add_error("User is not an active staff member");
        }
        if !has_required_permissions {
            result.add_error(format!(
                "User lacks required permissions: {}",
                missing.join(", ")
            ));
        }
        if let Some(role) = current_role {
            result = result.with_metadata("current_role", role);
        }
        if context.is_guild_owner {
            result = result.with_bypass(BypassType::GuildOwner);
        }

        StaffValidation {
            result,
            is_active_staff,
            current_role,
            has_required_permissions,
        }
    }

    /// Checks a named permission through the permission service.
    ///
    /// The guild owner always passes. An unknown name denies with the same
    /// message as an absent permission.
    pub fn validate_permission(
        &self,
        context: &PermissionContext,
        required_permission: &str,
    ) -> PermissionValidation {
        if context.is_guild_owner {
            return PermissionValidation {
                result: ValidationResult::success().with_bypass(BypassType::GuildOwner),
                has_permission: true,
                required_permission: required_permission.to_string(),
            };
        }

        let has_permission: bool = required_permission
            .parse::<PermissionName>()
            .is_ok_and(|permission| self.dispatch(context, permission));

        let result: ValidationResult = if has_permission {
            ValidationResult::success()
        } else {
            ValidationResult::failure(format!(
                "Missing required permission: {required_permission}"
            ))
        };
        PermissionValidation {
            result,
            has_permission,
            required_permission: required_permission.to_string(),
        }
    }

    fn dispatch(&self, context: &PermissionContext, permission: PermissionName) -> bool {
        match permission {
            PermissionName::SeniorStaff => self
                .permissions
                .has_senior_staff_permission_with_context(context),
            PermissionName::Lawyer => self.permissions.has_lawyer_permission_with_context(context),
            PermissionName::LeadAttorney => self
                .permissions
                .has_lead_attorney_permission_with_context(context),
            PermissionName::Admin => self.permissions.is_admin(context),
            PermissionName::Case | PermissionName::Config | PermissionName::Repair => {
                self.permissions.has_action_permission(context, permission)
            }
        }
    }
}
