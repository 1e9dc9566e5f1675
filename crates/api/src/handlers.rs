// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Slash-command handlers.
//!
//! Every command follows the same shape: parse the options, declare the
//! rules it needs as a [`ValidationPipeline`], stop unless the pipeline
//! says proceed, then call exactly one service operation. Cases are always
//! looked up within the invoking guild; a case from another guild is
//! reported as not found.

use anarchy::{
    BusinessRuleValidationService, CaseRequest, CaseService, CommandValidationService, CoreError,
    CrossEntityValidationService, EntityPayload, EntityType, Operation, PermissionService,
    RollbackConfig, RollbackService, SharedAuditSink, SharedCaseChannelGateway,
    SharedCaseCounterRepository, SharedCaseRepository, SharedClientNotifier,
    SharedGuildConfigRepository, SharedReminderRepository, SharedStaffRepository,
    SharedUnitOfWorkFactory, StaffService, TransactionalCaseService, ValidationOutcome,
    ValidationPipeline, record_audit,
};
use anarchy_audit::{AuditAction, AuditDetails, AuditLogEntry};
use anarchy_domain::{
    Case, CaseId, CasePriority, CaseResult, CaseStatus, ChannelId, DomainError, GuildConfig,
    PermissionContext, PermissionName, RoleId, Staff, StaffRole, UserId, ValidationResult,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::bypass::{BypassRegistry, PendingCommand};
use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::request_response::{
    AcceptCaseRequest, AddNoteRequest, CaseInfo, CaseLawyerRequest, ChangeRoleRequest,
    CloseCaseRequest, CommandResponse, ConfirmBypassRequest, ConfirmedCommand, CreateCaseRequest,
    DeclineCaseRequest, FireStaffRequest, GuildConfigInfo, HireStaffRequest, InvocationContext,
    ListCasesRequest, PermissionSummaryInfo, ReassignLawyerRequest, ReassignmentInfo, StaffInfo,
    UpdateGuildConfigRequest, UpdatePriorityRequest,
};

/// Everything the handlers are wired to.
pub struct HandlerDependencies {
    pub staff: SharedStaffRepository,
    pub cases: SharedCaseRepository,
    pub counters: SharedCaseCounterRepository,
    pub guild_configs: SharedGuildConfigRepository,
    pub reminders: SharedReminderRepository,
    pub audit: SharedAuditSink,
    pub unit_of_work_factory: SharedUnitOfWorkFactory,
    pub channels: SharedCaseChannelGateway,
    pub notifier: SharedClientNotifier,
    pub rollback: RollbackConfig,
}

pub struct CommandHandlers {
    permissions: Arc<PermissionService>,
    business_rules: BusinessRuleValidationService,
    cross_entity: CrossEntityValidationService,
    command_validation: CommandValidationService,
    staff_service: StaffService,
    case_service: CaseService,
    transactional: TransactionalCaseService,
    guild_configs: SharedGuildConfigRepository,
    audit: SharedAuditSink,
    bypasses: BypassRegistry,
}

impl CommandHandlers {
    #[must_use]
    pub fn new(dependencies: HandlerDependencies) -> Self {
        let permissions: Arc<PermissionService> =
            Arc::new(PermissionService::new(Arc::clone(&dependencies.guild_configs)));
        let rollback: Arc<RollbackService> = Arc::new(RollbackService::new(dependencies.rollback));

        Self {
            business_rules: BusinessRuleValidationService::new(
                Arc::clone(&dependencies.staff),
                Arc::clone(&dependencies.cases),
                Arc::clone(&permissions),
            ),
            cross_entity: CrossEntityValidationService::new(
                Arc::clone(&dependencies.cases),
                Arc::clone(&dependencies.staff),
                dependencies.reminders,
            ),
            command_validation: CommandValidationService::new(),
            staff_service: StaffService::new(dependencies.staff, Arc::clone(&dependencies.audit)),
            case_service: CaseService::new(
                dependencies.cases,
                dependencies.counters,
                Arc::clone(&dependencies.audit),
            ),
            transactional: TransactionalCaseService::new(
                dependencies.unit_of_work_factory,
                rollback,
                Arc::clone(&dependencies.guild_configs),
                dependencies.channels,
                dependencies.notifier,
                Arc::clone(&dependencies.audit),
            ),
            permissions,
            guild_configs: dependencies.guild_configs,
            audit: dependencies.audit,
            bypasses: BypassRegistry::new(),
        }
    }

    /// The bypass confirmations currently waiting.
    #[must_use]
    pub const fn bypasses(&self) -> &BypassRegistry {
        &self.bypasses
    }

    /// Reports which permissions the invoking member holds.
    #[must_use]
    pub fn permission_summary(&self, invocation: &InvocationContext) -> PermissionSummaryInfo {
        let context: PermissionContext = invocation.permission_context();
        PermissionSummaryInfo::from(&self.permissions.get_permission_summary(&context))
    }

    // ------------------------------------------------------------------
    // Staff
    // ------------------------------------------------------------------

    /// Hires a member into a role.
    ///
    /// # Errors
    ///
    /// Returns `ConfirmationRequired` when only the role cap blocks a guild
    /// owner, `ValidationFailed` for any other failed rule, and the
    /// translated service error otherwise.
    pub fn hire_staff(
        &self,
        invocation: &InvocationContext,
        request: &HireStaffRequest,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        self.run_hire_staff(&invocation.permission_context(), request, false)
    }

    /// Terminates a member. Members leading open cases cannot be fired.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if a rule fails, or the translated service
    /// error.
    pub fn fire_staff(
        &self,
        invocation: &InvocationContext,
        request: &FireStaffRequest,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let user_id: UserId = UserId::new(&request.user_id);

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::SeniorStaff.as_str())
            .require_entity(
                &self.cross_entity,
                EntityType::Staff,
                Operation::Fire,
                EntityPayload::for_staff(user_id.clone()),
            );
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let staff: Staff = self
            .staff_service
            .fire_staff(
                &context.guild_id,
                &user_id,
                &context.user_id,
                request.reason.as_deref(),
            )
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            StaffInfo::from(&staff),
            warnings,
            format!("Terminated {user_id}"),
        ))
    }

    /// Promotes a member to a higher role.
    ///
    /// # Errors
    ///
    /// Same as [`Self::hire_staff`], plus a rule violation when the target
    /// role is not above the current one.
    pub fn promote_staff(
        &self,
        invocation: &InvocationContext,
        request: &ChangeRoleRequest,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        self.run_promote_staff(&invocation.permission_context(), request, false)
    }

    /// Demotes a member to a lower role.
    ///
    /// # Errors
    ///
    /// Same as [`Self::promote_staff`], with the rule violation raised when
    /// the target role is not below the current one.
    pub fn demote_staff(
        &self,
        invocation: &InvocationContext,
        request: &ChangeRoleRequest,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        self.run_demote_staff(&invocation.permission_context(), request, false)
    }

    /// Lists the guild's active staff, highest role first.
    ///
    /// # Errors
    ///
    /// Returns the translated service error if the lookup fails.
    pub fn list_staff(&self, invocation: &InvocationContext) -> Result<Vec<StaffInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let staff: Vec<Staff> = self
            .staff_service
            .list_staff(&context.guild_id)
            .map_err(translate_core_error)?;
        Ok(staff.iter().map(StaffInfo::from).collect())
    }

    // ------------------------------------------------------------------
    // Cases
    // ------------------------------------------------------------------

    /// Opens a case for the invoking member and creates its channel.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` when the client has too many open cases,
    /// `InvalidInput` for a bad title or priority, and `Internal` if the
    /// transactional creation fails.
    pub fn create_case(
        &self,
        invocation: &InvocationContext,
        request: &CreateCaseRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let priority: CasePriority = match request.priority.as_deref() {
            Some(priority) => parse_option(priority)?,
            None => CasePriority::default(),
        };

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new().require_business_rule(
            "client_case_limit",
            move |ctx: &PermissionContext| {
                self.business_rules
                    .validate_client_case_limit(&ctx.user_id, &ctx.guild_id)
                    .into()
            },
        );
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case_request: CaseRequest = CaseRequest {
            guild_id: context.guild_id.clone(),
            client_id: context.user_id.clone(),
            client_username: request.client_username.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            priority,
        };
        let case: Case = self
            .transactional
            .create_case(case_request, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Case {} created", case.case_number),
        ))
    }

    /// Accepts a pending case; the invoking lawyer becomes its lead.
    ///
    /// # Errors
    ///
    /// Returns `ConfirmationRequired` when a guild owner who is not staff
    /// accepts, `ValidationFailed` for other failed rules, and a
    /// `case_status` violation if someone else accepted first.
    pub fn accept_case(
        &self,
        invocation: &InvocationContext,
        request: &AcceptCaseRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        self.run_accept_case(&invocation.permission_context(), request, false)
    }

    /// Declines a pending case.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if a rule fails, or the translated service
    /// error.
    pub fn decline_case(
        &self,
        invocation: &InvocationContext,
        request: &DeclineCaseRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Lawyer.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .case_service
            .decline_case(case_id, &context.user_id, request.reason.clone())
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Case {} declined", case.case_number),
        ))
    }

    /// Closes an in-progress case and archives its channel.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` while reminders are unresolved,
    /// `InvalidInput` for an unknown result, and the translated service
    /// error otherwise.
    pub fn close_case(
        &self,
        invocation: &InvocationContext,
        request: &CloseCaseRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let result: CaseResult = parse_option(&request.result)?;
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::LeadAttorney.as_str())
            .require_entity(
                &self.cross_entity,
                EntityType::Case,
                Operation::Close,
                EntityPayload::for_case(case_id),
            );
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .transactional
            .close_case(
                &context.guild_id,
                case_id,
                &context.user_id,
                result,
                request.notes.clone(),
            )
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Case {} closed: {result}", case.case_number),
        ))
    }

    /// Adds a lawyer to a case and grants them channel access.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the case is closed or the target is not
    /// an active lawyer, or the translated service error.
    pub fn assign_lawyer(
        &self,
        invocation: &InvocationContext,
        request: &CaseLawyerRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let lawyer_id: UserId = UserId::new(&request.lawyer_id);
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::LeadAttorney.as_str())
            .require_entity(
                &self.cross_entity,
                EntityType::Case,
                Operation::Assign,
                EntityPayload::for_case(case_id).with_user(lawyer_id.clone()),
            );
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .transactional
            .assign_lawyer(&context.guild_id, case_id, &lawyer_id, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("{lawyer_id} assigned to case {}", case.case_number),
        ))
    }

    /// Removes a lawyer from a case and revokes their channel access.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if a rule fails, or the translated service
    /// error.
    pub fn unassign_lawyer(
        &self,
        invocation: &InvocationContext,
        request: &CaseLawyerRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let lawyer_id: UserId = UserId::new(&request.lawyer_id);
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::LeadAttorney.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .transactional
            .unassign_lawyer(&context.guild_id, case_id, &lawyer_id, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("{lawyer_id} removed from case {}", case.case_number),
        ))
    }

    /// Moves a lawyer from one case to another, moving their channel access
    /// with them.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the destination cannot take the lawyer,
    /// or the translated service error.
    pub fn reassign_lawyer(
        &self,
        invocation: &InvocationContext,
        request: &ReassignLawyerRequest,
    ) -> Result<CommandResponse<ReassignmentInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let lawyer_id: UserId = UserId::new(&request.lawyer_id);
        let from_case_id: CaseId = self.load_case(&context, request.from_case_id)?.id;
        let to_case_id: CaseId = self.load_case(&context, request.to_case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::LeadAttorney.as_str())
            .require_entity(
                &self.cross_entity,
                EntityType::Case,
                Operation::Assign,
                EntityPayload::for_case(to_case_id).with_user(lawyer_id.clone()),
            );
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let (from_case, to_case): (Case, Case) = self
            .transactional
            .reassign_lawyer(
                &context.guild_id,
                from_case_id,
                to_case_id,
                &lawyer_id,
                &context.user_id,
            )
            .map_err(translate_core_error)?;
        let message: String = format!(
            "{lawyer_id} moved from case {} to case {}",
            from_case.case_number, to_case.case_number
        );
        Ok(CommandResponse::new(
            ReassignmentInfo {
                from_case: CaseInfo::from(&from_case),
                to_case: CaseInfo::from(&to_case),
            },
            warnings,
            message,
        ))
    }

    /// Makes an assigned lawyer the case's lead attorney.
    ///
    /// # Errors
    ///
    /// Returns a rule violation if the lawyer is not assigned, or the
    /// translated service error.
    pub fn set_lead_attorney(
        &self,
        invocation: &InvocationContext,
        request: &CaseLawyerRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let lawyer_id: UserId = UserId::new(&request.lawyer_id);
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::LeadAttorney.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .case_service
            .set_lead_attorney(case_id, &lawyer_id, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("{lawyer_id} now leads case {}", case.case_number),
        ))
    }

    /// Adds a note to an open case.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if a rule fails, or the translated service
    /// error.
    pub fn add_note(
        &self,
        invocation: &InvocationContext,
        request: &AddNoteRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Lawyer.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .case_service
            .add_note(
                case_id,
                &request.content,
                &context.user_id,
                request.is_internal,
            )
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Note added to case {}", case.case_number),
        ))
    }

    /// Changes the priority of an open case.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown priority, `ValidationFailed`
    /// if a rule fails, or the translated service error.
    pub fn update_priority(
        &self,
        invocation: &InvocationContext,
        request: &UpdatePriorityRequest,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let priority: CasePriority = parse_option(&request.priority)?;
        let case_id: CaseId = self.load_case(&context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Lawyer.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let case: Case = self
            .case_service
            .update_priority(case_id, priority, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Case {} priority set to {priority}", case.case_number),
        ))
    }

    /// Shows one case to its client, its lawyers, or holders of `case`.
    ///
    /// Clients do not see internal notes.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for a missing case and `Unauthorized` for
    /// anyone else.
    pub fn get_case(
        &self,
        invocation: &InvocationContext,
        case_id: i64,
    ) -> Result<CaseInfo, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let case: Case = self.load_case(&context, case_id)?;

        let is_participant: bool =
            case.client_id == context.user_id || case.has_lawyer(&context.user_id);
        let can_view_cases: bool = ValidationResult::from(
            self.business_rules
                .validate_permission(&context, PermissionName::Case.as_str()),
        )
        .valid;
        if !is_participant && !can_view_cases {
            return Err(ApiError::Unauthorized {
                action: String::from("get_case"),
                message: String::from(
                    "Only the client, assigned lawyers and case staff can view this case",
                ),
            });
        }

        let mut info: CaseInfo = CaseInfo::from(&case);
        let client_only: bool = case.client_id == context.user_id
            && !case.has_lawyer(&context.user_id)
            && !can_view_cases;
        if client_only {
            info.notes.retain(|note| !note.is_internal);
        }
        Ok(info)
    }

    /// Lists the guild's cases in one status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown status, `ValidationFailed`
    /// without the `case` permission, or the translated service error.
    pub fn list_cases(
        &self,
        invocation: &InvocationContext,
        request: &ListCasesRequest,
    ) -> Result<CommandResponse<Vec<CaseInfo>>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let status: CaseStatus = parse_option(&request.status)?;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Case.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let cases: Vec<Case> = self
            .case_service
            .list_cases_by_status(&context.guild_id, status)
            .map_err(translate_core_error)?;
        let message: String = format!("{} {status} case(s)", cases.len());
        Ok(CommandResponse::new(
            cases.iter().map(CaseInfo::from).collect(),
            warnings,
            message,
        ))
    }

    /// Lists the open cases the invoking lawyer is assigned to.
    ///
    /// # Errors
    ///
    /// Returns the translated service error if the lookup fails.
    pub fn my_cases(&self, invocation: &InvocationContext) -> Result<Vec<CaseInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let cases: Vec<Case> = self
            .case_service
            .list_cases_for_lawyer(&context.guild_id, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(cases
            .iter()
            .filter(|case| case.status != CaseStatus::Closed)
            .map(CaseInfo::from)
            .collect())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Shows the guild's configuration, creating a default one if missing.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` without the `admin` permission, or
    /// `Internal` if storage fails.
    pub fn get_guild_config(
        &self,
        invocation: &InvocationContext,
    ) -> Result<GuildConfigInfo, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Admin.as_str());
        self.gate(&context, &pipeline, false, None)?;

        let config: GuildConfig = self
            .guild_configs
            .ensure_guild_config(&context.guild_id)
            .map_err(|err| translate_core_error(CoreError::Repository(err)))?;
        Ok(GuildConfigInfo::from(&config))
    }

    /// Replaces the guild's configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown permission name,
    /// `ValidationFailed` without the `admin` permission, or `Internal` if
    /// storage fails.
    pub fn update_guild_config(
        &self,
        invocation: &InvocationContext,
        request: &UpdateGuildConfigRequest,
    ) -> Result<CommandResponse<GuildConfigInfo>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Admin.as_str());
        let warnings: Vec<String> = self.gate(&context, &pipeline, false, None)?;

        let mut config: GuildConfig = GuildConfig::new(context.guild_id.clone());
        config.admin_users = request.admin_users.iter().map(|id| UserId::new(id)).collect();
        config.admin_roles = request.admin_roles.iter().map(|id| RoleId::new(id)).collect();
        for entry in &request.permissions {
            let permission: PermissionName = parse_option(&entry.permission)?;
            for role in &entry.roles {
                config.grant(permission, RoleId::new(role));
            }
        }
        config.case_review_category_id = request
            .case_review_category_id
            .as_deref()
            .map(ChannelId::new);
        config.case_archive_category_id = request
            .case_archive_category_id
            .as_deref()
            .map(ChannelId::new);
        config.feedback_channel_id = request.feedback_channel_id.as_deref().map(ChannelId::new);

        let saved: GuildConfig = self
            .guild_configs
            .update_guild_config(&config)
            .map_err(|err| translate_core_error(CoreError::Repository(err)))?;
        info!(guild_id = %context.guild_id, "Guild configuration updated");
        self.record(
            &context,
            AuditAction::ConfigChanged,
            None,
            AuditDetails::new()
                .with_metadata("admin_users", saved.admin_users.len())
                .with_metadata("admin_roles", saved.admin_roles.len())
                .with_metadata("permissions", saved.permissions.len()),
        );
        Ok(CommandResponse::new(
            GuildConfigInfo::from(&saved),
            warnings,
            "Guild configuration updated",
        ))
    }

    // ------------------------------------------------------------------
    // Guild-owner bypass
    // ------------------------------------------------------------------

    /// Re-runs a parked command with the owner's bypass accepted.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown, used or expired token,
    /// `Unauthorized` for anyone but the owner who started the command, and
    /// whatever the re-run command returns.
    pub fn confirm_bypass(
        &self,
        invocation: &InvocationContext,
        request: &ConfirmBypassRequest,
    ) -> Result<CommandResponse<ConfirmedCommand>, ApiError> {
        let context: PermissionContext = invocation.permission_context();
        let command: PendingCommand = self.bypasses.take(&request.token, &context)?;
        let command_name: &'static str = command.name();

        let (response, target_id): (CommandResponse<ConfirmedCommand>, String) = match command {
            PendingCommand::HireStaff(pending) => (
                self.run_hire_staff(&context, &pending, true)?
                    .map(ConfirmedCommand::Staff),
                pending.user_id,
            ),
            PendingCommand::PromoteStaff(pending) => (
                self.run_promote_staff(&context, &pending, true)?
                    .map(ConfirmedCommand::Staff),
                pending.user_id,
            ),
            PendingCommand::DemoteStaff(pending) => (
                self.run_demote_staff(&context, &pending, true)?
                    .map(ConfirmedCommand::Staff),
                pending.user_id,
            ),
            PendingCommand::AcceptCase(pending) => (
                self.run_accept_case(&context, &pending, true)?
                    .map(ConfirmedCommand::Case),
                pending.case_id.to_string(),
            ),
        };

        info!(
            guild_id = %context.guild_id,
            user_id = %context.user_id,
            command = command_name,
            "Guild owner bypass applied"
        );
        self.record(
            &context,
            AuditAction::GuildOwnerBypass,
            Some(target_id),
            AuditDetails::new().with_metadata("command", command_name),
        );
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Bypassable command bodies
    // ------------------------------------------------------------------

    fn run_hire_staff(
        &self,
        context: &PermissionContext,
        request: &HireStaffRequest,
        accept_bypass: bool,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        let role: StaffRole = parse_option(&request.role)?;
        let user_id: UserId = UserId::new(&request.user_id);

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::SeniorStaff.as_str())
            .require_business_rule("role_limit", move |ctx: &PermissionContext| {
                self.business_rules.validate_role_limit(ctx, role).into()
            });
        let warnings: Vec<String> = self.gate(
            context,
            &pipeline,
            accept_bypass,
            Some(PendingCommand::HireStaff(request.clone())),
        )?;

        let staff: Staff = self
            .staff_service
            .hire_staff(&context.guild_id, &user_id, role, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            StaffInfo::from(&staff),
            warnings,
            format!("Hired {user_id} as {role}"),
        ))
    }

    fn run_promote_staff(
        &self,
        context: &PermissionContext,
        request: &ChangeRoleRequest,
        accept_bypass: bool,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        let role: StaffRole = parse_option(&request.role)?;
        let user_id: UserId = UserId::new(&request.user_id);

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::SeniorStaff.as_str())
            .require_business_rule("role_limit", move |ctx: &PermissionContext| {
                self.business_rules.validate_role_limit(ctx, role).into()
            });
        let warnings: Vec<String> = self.gate(
            context,
            &pipeline,
            accept_bypass,
            Some(PendingCommand::PromoteStaff(request.clone())),
        )?;

        let staff: Staff = self
            .staff_service
            .promote_staff(&context.guild_id, &user_id, role, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            StaffInfo::from(&staff),
            warnings,
            format!("Promoted {user_id} to {role}"),
        ))
    }

    fn run_demote_staff(
        &self,
        context: &PermissionContext,
        request: &ChangeRoleRequest,
        accept_bypass: bool,
    ) -> Result<CommandResponse<StaffInfo>, ApiError> {
        let role: StaffRole = parse_option(&request.role)?;
        let user_id: UserId = UserId::new(&request.user_id);

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::SeniorStaff.as_str())
            .require_business_rule("role_limit", move |ctx: &PermissionContext| {
                self.business_rules.validate_role_limit(ctx, role).into()
            })
            .require_entity(
                &self.cross_entity,
                EntityType::Staff,
                Operation::Demote,
                EntityPayload::for_staff(user_id.clone()).with_role(role),
            );
        let warnings: Vec<String> = self.gate(
            context,
            &pipeline,
            accept_bypass,
            Some(PendingCommand::DemoteStaff(request.clone())),
        )?;

        let staff: Staff = self
            .staff_service
            .demote_staff(&context.guild_id, &user_id, role, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            StaffInfo::from(&staff),
            warnings,
            format!("Demoted {user_id} to {role}"),
        ))
    }

    fn run_accept_case(
        &self,
        context: &PermissionContext,
        request: &AcceptCaseRequest,
        accept_bypass: bool,
    ) -> Result<CommandResponse<CaseInfo>, ApiError> {
        let case_id: CaseId = self.load_case(context, request.case_id)?.id;

        let pipeline: ValidationPipeline<'_> = ValidationPipeline::new()
            .require_permission(&self.business_rules, PermissionName::Lawyer.as_str())
            .require_business_rule("staff_member", move |ctx: &PermissionContext| {
                self.business_rules
                    .validate_staff_member(ctx, &ctx.user_id, &[PermissionName::Lawyer.as_str()])
                    .into()
            });
        let warnings: Vec<String> = self.gate(
            context,
            &pipeline,
            accept_bypass,
            Some(PendingCommand::AcceptCase(request.clone())),
        )?;

        let case: Case = self
            .case_service
            .accept_case(case_id, &context.user_id)
            .map_err(translate_core_error)?;
        Ok(CommandResponse::new(
            CaseInfo::from(&case),
            warnings,
            format!("Case {} accepted", case.case_number),
        ))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Runs a pipeline and turns anything but `Proceed` into an error.
    ///
    /// A bypassable failure is parked under a token only when the command
    /// supplied one to park; `pending` is ignored once the bypass is
    /// accepted.
    fn gate(
        &self,
        context: &PermissionContext,
        pipeline: &ValidationPipeline<'_>,
        accept_bypass: bool,
        pending: Option<PendingCommand>,
    ) -> Result<Vec<String>, ApiError> {
        match pipeline
            .run(&self.command_validation, context, accept_bypass)
            .outcome()
        {
            ValidationOutcome::Proceed { warnings } => Ok(warnings),
            ValidationOutcome::RequiresConfirmation { errors, .. } => match pending {
                Some(command) if !accept_bypass => {
                    let token: String = self.bypasses.register(context, command);
                    Err(ApiError::ConfirmationRequired { token, errors })
                }
                _ => Err(ApiError::ValidationFailed { errors }),
            },
            ValidationOutcome::Denied { errors } => {
                debug!(
                    guild_id = %context.guild_id,
                    user_id = %context.user_id,
                    "Command denied by validation"
                );
                Err(ApiError::ValidationFailed { errors })
            }
        }
    }

    fn load_case(&self, context: &PermissionContext, case_id: i64) -> Result<Case, ApiError> {
        self.case_service
            .get_case(CaseId::new(case_id))
            .map_err(translate_core_error)?
            .filter(|case| case.guild_id == context.guild_id)
            .ok_or_else(|| translate_core_error(CoreError::CaseNotFound))
    }

    fn record(
        &self,
        context: &PermissionContext,
        action: AuditAction,
        target_id: Option<String>,
        details: AuditDetails,
    ) {
        let entry: AuditLogEntry = AuditLogEntry::new(
            context.guild_id.clone(),
            action,
            context.user_id.clone(),
            target_id,
            details,
        );
        record_audit(self.audit.as_ref(), &entry);
    }
}

/// Parses a slash-command option into a domain value.
fn parse_option<T>(value: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    value.parse::<T>().map_err(translate_domain_error)
}
