// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Case mutations that pair a storage transaction with Discord side effects.
//!
//! Storage writes go through the transaction-bound repositories of a
//! [`UnitOfWork`]. Discord calls cannot join that transaction, so each one
//! has its undo registered with the [`RollbackService`] before it runs. On
//! any failure the transaction is rolled back, the compensations run, and
//! the caller sees only a generic message.

use crate::audit_trail;
use crate::case_service::{CaseRequest, close_with};
use crate::error::CoreError;
use crate::repository::{
    GatewayError, RepositoryError, SharedAuditSink, SharedCaseChannelGateway,
    SharedClientNotifier, SharedGuildConfigRepository, SharedUnitOfWorkFactory, UnitOfWork,
};
use crate::rollback::{CompensationAction, RollbackContext, RollbackReport, RollbackService};
use anarchy_audit::{AuditAction, AuditDetails, AuditLogEntry};
use anarchy_domain::{
    Case, CaseId, CaseResult, CaseStatus, CaseTransition, ChannelId, GuildConfig, GuildId,
    UserId, validate_case_title,
};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, info};

const CLIENT_FAILURE_MESSAGE: &str =
    "We were unable to open your case. Please try again later or contact staff.";

/// A failed step inside a transaction.
#[derive(Debug, Error)]
enum StepError {
    /// An expected, user-facing failure that is reported as is.
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub struct TransactionalCaseService {
    unit_of_work_factory: SharedUnitOfWorkFactory,
    rollback: Arc<RollbackService>,
    guild_configs: SharedGuildConfigRepository,
    channels: SharedCaseChannelGateway,
    notifier: SharedClientNotifier,
    audit: SharedAuditSink,
}

impl TransactionalCaseService {
    #[must_use]
    pub fn new(
        unit_of_work_factory: SharedUnitOfWorkFactory,
        rollback: Arc<RollbackService>,
        guild_configs: SharedGuildConfigRepository,
        channels: SharedCaseChannelGateway,
        notifier: SharedClientNotifier,
        audit: SharedAuditSink,
    ) -> Self {
        Self {
            unit_of_work_factory,
            rollback,
            guild_configs,
            channels,
            notifier,
            audit,
        }
    }

    /// Creates a case and its private channel atomically.
    ///
    /// The case number is reserved inside the transaction, so a failed
    /// creation consumes no visible number. On failure the client is
    /// notified, the failure is audited, and any channel already created is
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns a domain error for an invalid title, otherwise
    /// `CaseCreationFailed` for every failure.
    pub fn create_case(&self, request: CaseRequest, actor_id: &UserId) -> Result<Case, CoreError> {
        validate_case_title(&request.title)?;
        let guild_id: GuildId = request.guild_id.clone();
        let config: GuildConfig = self.load_config(&guild_id, CoreError::CaseCreationFailed)?;
        let created_channel: Arc<Mutex<Option<ChannelId>>> = Arc::new(Mutex::new(None));

        let case: Case = self.run_in_transaction(
            "create_case",
            &guild_id,
            actor_id,
            CoreError::CaseCreationFailed,
            |uow| {
                self.register_creation_compensations(
                    uow.transaction_id(),
                    &request,
                    actor_id,
                    &created_channel,
                );

                uow.begin()?;
                let sequence: u32 = uow.counters().get_next_case_number(&guild_id)?;
                let mut case: Case = uow
                    .cases()
                    .add(&request.into_new_case(sequence, OffsetDateTime::now_utc()))?;

                let channel_id: ChannelId = self
                    .channels
                    .create_case_channel(&case, config.case_review_category_id.as_ref())?;
                *created_channel
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(channel_id.clone());

                case.channel_id = Some(channel_id);
                let case: Case = uow
                    .cases()
                    .update(&case)?
                    .ok_or(CoreError::CaseCreationFailed)?;
                uow.commit()?;
                Ok(case)
            },
        )?;

        info!(
            guild_id = %case.guild_id,
            case_id = %case.id,
            case_number = %case.case_number,
            "Created case"
        );
        self.record(
            &case,
            AuditAction::CaseCreated,
            actor_id,
            AuditDetails::new().with_metadata("case_number", &case.case_number),
        );
        Ok(case)
    }

    /// Assigns a lawyer and grants them access to the case channel.
    ///
    /// Assigning an already-assigned lawyer commits nothing and returns the
    /// case unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CaseNotFound`, `AssignmentFailed` or a domain error as is, and
    /// `LawyerAssignmentFailed` for storage or Discord failures.
    pub fn assign_lawyer(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
        lawyer_id: &UserId,
        actor_id: &UserId,
    ) -> Result<Case, CoreError> {
        let mut assigned: bool = false;
        let case: Case = self.run_in_transaction(
            "assign_lawyer",
            guild_id,
            actor_id,
            CoreError::LawyerAssignmentFailed,
            |uow| {
                self.register_operation_audit(
                    uow.transaction_id(),
                    guild_id,
                    case_id,
                    actor_id,
                    "assign_lawyer",
                );
                uow.begin()?;
                let mut case: Case = load_open_case(&*uow, guild_id, case_id)?;
                if !case.assign_lawyer(lawyer_id) {
                    uow.commit()?;
                    return Ok(case);
                }
                let case: Case = write_edit(&*uow, case)?;
                if let Some(channel_id) = &case.channel_id {
                    self.grant_access(uow.transaction_id(), guild_id, channel_id, lawyer_id)?;
                }

                uow.commit()?;
                assigned = true;
                Ok(case)
            },
        )?;

        if assigned {
            info!(
                guild_id = %guild_id,
                case_id = %case.id,
                lawyer_id = %lawyer_id,
                "Assigned lawyer"
            );
            self.record(
                &case,
                AuditAction::LawyerAssigned,
                actor_id,
                AuditDetails::new().with_metadata("lawyer_id", lawyer_id),
            );
        } else {
            debug!(case_id = %case.id, lawyer_id = %lawyer_id, "Lawyer already assigned");
        }
        Ok(case)
    }

    /// Removes a lawyer and revokes their access to the case channel.
    ///
    /// The next assigned lawyer becomes lead if the lead leaves. Removing a
    /// lawyer who is not on the case commits nothing.
    ///
    /// # Errors
    ///
    /// Returns `CaseNotFound`, `AssignmentFailed` or a domain error as is, and
    /// `LawyerUnassignmentFailed` for storage or Discord failures.
    pub fn unassign_lawyer(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
        lawyer_id: &UserId,
        actor_id: &UserId,
    ) -> Result<Case, CoreError> {
        let mut previous_lead: Option<UserId> = None;
        let mut unassigned: bool = false;
        let case: Case = self.run_in_transaction(
            "unassign_lawyer",
            guild_id,
            actor_id,
            CoreError::LawyerUnassignmentFailed,
            |uow| {
                self.register_operation_audit(
                    uow.transaction_id(),
                    guild_id,
                    case_id,
                    actor_id,
                    "unassign_lawyer",
                );
                uow.begin()?;
                let mut case: Case = load_open_case(&*uow, guild_id, case_id)?;
                previous_lead = case.lead_attorney_id.clone();
                if !case.unassign_lawyer(lawyer_id) {
                    uow.commit()?;
                    return Ok(case);
                }
                let case: Case = write_edit(&*uow, case)?;
                if let Some(channel_id) = &case.channel_id {
                    self.revoke_access(uow.transaction_id(), guild_id, channel_id, lawyer_id)?;
                }

                uow.commit()?;
                unassigned = true;
                Ok(case)
            },
        )?;

        if unassigned {
            info!(
                guild_id = %guild_id,
                case_id = %case.id,
                lawyer_id = %lawyer_id,
                "Unassigned lawyer"
            );
            let mut details: AuditDetails =
                AuditDetails::new().with_metadata("lawyer_id", lawyer_id);
            if previous_lead != case.lead_attorney_id {
                details = details.with_metadata(
                    "new_lead_attorney_id",
                    case.lead_attorney_id.as_ref().map_or("none", UserId::as_str),
                );
            }
            self.record(&case, AuditAction::LawyerUnassigned, actor_id, details);
        } else {
            debug!(case_id = %case.id, lawyer_id = %lawyer_id, "Lawyer not on case");
        }
        Ok(case)
    }

    /// Moves a lawyer from one case to another in a single transaction.
    ///
    /// Access to the old case channel is revoked and access to the new one
    /// granted. A failure at any step restores both cases and undoes any
    /// channel change already made. Moving a lawyer onto the case they are
    /// on changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CaseNotFound`, `AssignmentFailed` or a domain error as is, and
    /// `LawyerReassignmentFailed` for storage or Discord failures.
    pub fn reassign_lawyer(
        &self,
        guild_id: &GuildId,
        from_case_id: CaseId,
        to_case_id: CaseId,
        lawyer_id: &UserId,
        actor_id: &UserId,
    ) -> Result<(Case, Case), CoreError> {
        let mut removed: bool = false;
        let mut added: bool = false;
        let (from, to): (Case, Case) = self.run_in_transaction(
            "reassign_lawyer",
            guild_id,
            actor_id,
            CoreError::LawyerReassignmentFailed,
            |uow| {
                uow.begin()?;
                if from_case_id == to_case_id {
                    let case: Case = uow
                        .cases()
                        .find_by_id(from_case_id)?
                        .filter(|case| &case.guild_id == guild_id)
                        .ok_or(CoreError::CaseNotFound)?;
                    uow.commit()?;
                    return Ok((case.clone(), case));
                }
                self.register_operation_audit(
                    uow.transaction_id(),
                    guild_id,
                    from_case_id,
                    actor_id,
                    "reassign_lawyer",
                );

                let mut to: Case = load_open_case(&*uow, guild_id, to_case_id)?;
                let mut from: Case = load_open_case(&*uow, guild_id, from_case_id)?;

                if from.unassign_lawyer(lawyer_id) {
                    from = write_edit(&*uow, from)?;
                    if let Some(channel_id) = &from.channel_id {
                        self.revoke_access(uow.transaction_id(), guild_id, channel_id, lawyer_id)?;
                    }
                    removed = true;
                }
                if to.assign_lawyer(lawyer_id) {
                    to = write_edit(&*uow, to)?;
                    if let Some(channel_id) = &to.channel_id {
                        self.grant_access(uow.transaction_id(), guild_id, channel_id, lawyer_id)?;
                    }
                    added = true;
                }

                uow.commit()?;
                Ok((from, to))
            },
        )?;

        info!(
            guild_id = %guild_id,
            from_case_id = %from.id,
            to_case_id = %to.id,
            lawyer_id = %lawyer_id,
            "Reassigned lawyer"
        );
        if removed {
            self.record(
                &from,
                AuditAction::LawyerUnassigned,
                actor_id,
                AuditDetails::new()
                    .with_metadata("lawyer_id", lawyer_id)
                    .with_metadata("reassigned_to", to.id),
            );
        }
        if added {
            self.record(
                &to,
                AuditAction::LawyerAssigned,
                actor_id,
                AuditDetails::new()
                    .with_metadata("lawyer_id", lawyer_id)
                    .with_metadata("reassigned_from", from.id),
            );
        }
        Ok((from, to))
    }

    /// Closes an in-progress case and archives its channel.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCaseStatus` or `CaseNotFound` as is, and
    /// `CaseCloseFailed` for storage or Discord failures.
    pub fn close_case(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
        closed_by: &UserId,
        result: CaseResult,
        result_notes: Option<String>,
    ) -> Result<Case, CoreError> {
        let config: GuildConfig = self.load_config(guild_id, CoreError::CaseCloseFailed)?;

        let case: Case = self.run_in_transaction(
            "close_case",
            guild_id,
            closed_by,
            CoreError::CaseCloseFailed,
            |uow| {
                self.register_operation_audit(
                    uow.transaction_id(),
                    guild_id,
                    case_id,
                    closed_by,
                    "close_case",
                );
                uow.begin()?;
                let case: Case = uow
                    .cases()
                    .find_by_id(case_id)?
                    .filter(|case| &case.guild_id == guild_id)
                    .ok_or(CoreError::CaseNotFound)?;
                if !CaseTransition::Close.permits(case.status) {
                    return Err(CoreError::InvalidCaseStatus {
                        transition: CaseTransition::Close,
                        status: case.status,
                    }
                    .into());
                }

                let closed: Case = close_with(case, closed_by, result, result_notes);
                let Some(closed) = uow
                    .cases()
                    .conditional_update_status(&closed, CaseStatus::InProgress)?
                else {
                    let status: CaseStatus = uow
                        .cases()
                        .find_by_id(case_id)?
                        .ok_or(CoreError::CaseNotFound)?
                        .status;
                    return Err(CoreError::InvalidCaseStatus {
                        transition: CaseTransition::Close,
                        status,
                    }
                    .into());
                };

                if let Some(channel_id) = closed.channel_id.clone() {
                    let channels: SharedCaseChannelGateway = Arc::clone(&self.channels);
                    let guild: GuildId = guild_id.clone();
                    let channel: ChannelId = channel_id.clone();
                    let review_category: Option<ChannelId> =
                        config.case_review_category_id.clone();
                    self.rollback.register_compensation_action(
                        uow.transaction_id(),
                        CompensationAction::new("restore case channel", 3, move || {
                            channels
                                .restore_channel(&guild, &channel, review_category.as_ref())
                                .map_err(|err| err.to_string())
                        }),
                    );
                    self.channels.archive_channel(
                        guild_id,
                        &channel_id,
                        config.case_archive_category_id.as_ref(),
                    )?;
                }

                uow.commit()?;
                Ok(closed)
            },
        )?;

        info!(guild_id = %guild_id, case_id = %case.id, result = %result, "Closed case");
        self.record(
            &case,
            AuditAction::CaseClosed,
            closed_by,
            AuditDetails::transition(CaseStatus::InProgress.as_str(), case.status.as_str())
                .with_metadata("result", result),
        );
        Ok(case)
    }

    /// Runs `body` inside a fresh unit of work.
    ///
    /// On success the transaction's compensations are discarded. On failure
    /// the unit of work is rolled back, compensations run, and the error is
    /// replaced by `failure` unless it is an expected, user-facing one.
    fn run_in_transaction<T>(
        &self,
        operation: &str,
        guild_id: &GuildId,
        actor_id: &UserId,
        failure: CoreError,
        body: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, StepError>,
    ) -> Result<T, CoreError> {
        let mut unit_of_work: Box<dyn UnitOfWork + '_> = match self.unit_of_work_factory.create()
        {
            Ok(unit_of_work) => unit_of_work,
            Err(err) => {
                error!(
                    guild_id = %guild_id,
                    operation,
                    error = %err,
                    "Could not open unit of work"
                );
                return Err(failure);
            }
        };
        let transaction_id: String = unit_of_work.transaction_id().to_string();

        match body(unit_of_work.as_mut()) {
            Ok(value) => {
                drop(unit_of_work);
                self.rollback.clear(&transaction_id);
                Ok(value)
            }
            Err(err) => {
                let context: RollbackContext = self.rollback.create_rollback_context(
                    &transaction_id,
                    operation,
                    guild_id,
                    actor_id,
                    &err.to_string(),
                );
                let report: RollbackReport = self.rollback.perform_rollback(unit_of_work, &context);
                debug!(
                    transaction_id = %report.transaction_id,
                    rolled_back = report.transaction_rolled_back,
                    failed_compensations = report.compensations_failed.len(),
                    "Transaction failed"
                );
                match err {
                    StepError::Core(
                        core @ (CoreError::CaseNotFound
                        | CoreError::AssignmentFailed
                        | CoreError::InvalidCaseStatus { .. }
                        | CoreError::Domain(_)),
                    ) => Err(core),
                    _ => Err(failure),
                }
            }
        }
    }

    /// Registers the failure audit, client notification and channel
    /// deletion for a case creation.
    fn register_creation_compensations(
        &self,
        transaction_id: &str,
        request: &CaseRequest,
        actor_id: &UserId,
        created_channel: &Arc<Mutex<Option<ChannelId>>>,
    ) {
        let channels: SharedCaseChannelGateway = Arc::clone(&self.channels);
        let slot: Arc<Mutex<Option<ChannelId>>> = Arc::clone(created_channel);
        let guild_id: GuildId = request.guild_id.clone();
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("delete case channel", 3, move || {
                let channel: Option<ChannelId> =
                    slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
                match channel {
                    Some(channel_id) => channels
                        .delete_channel(&guild_id, &channel_id)
                        .map_err(|err| err.to_string()),
                    None => Ok(()),
                }
            }),
        );

        let notifier: SharedClientNotifier = Arc::clone(&self.notifier);
        let guild_id: GuildId = request.guild_id.clone();
        let client_id: UserId = request.client_id.clone();
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("notify client", 2, move || {
                notifier
                    .notify_client(&guild_id, &client_id, CLIENT_FAILURE_MESSAGE)
                    .map_err(|err| err.to_string())
            }),
        );

        let audit: SharedAuditSink = Arc::clone(&self.audit);
        let entry: AuditLogEntry = AuditLogEntry::new(
            request.guild_id.clone(),
            AuditAction::CaseCreationFailed,
            actor_id.clone(),
            Some(request.client_id.to_string()),
            AuditDetails::new()
                .with_reason("Case creation rolled back")
                .with_metadata("transaction_id", transaction_id),
        );
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("audit failed creation", 1, move || {
                audit.log_action(&entry).map_err(|err| err.to_string())
            }),
        );
    }

    fn register_operation_audit(
        &self,
        transaction_id: &str,
        guild_id: &GuildId,
        case_id: CaseId,
        actor_id: &UserId,
        operation: &str,
    ) {
        let audit: SharedAuditSink = Arc::clone(&self.audit);
        let entry: AuditLogEntry = AuditLogEntry::new(
            guild_id.clone(),
            AuditAction::CaseOperationFailed,
            actor_id.clone(),
            Some(case_id.to_string()),
            AuditDetails::new()
                .with_reason(format!("{operation} rolled back"))
                .with_metadata("transaction_id", transaction_id),
        );
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("audit failed operation", 1, move || {
                audit.log_action(&entry).map_err(|err| err.to_string())
            }),
        );
    }

    /// Registers a revoke as the undo, then grants `lawyer_id` the channel.
    fn grant_access(
        &self,
        transaction_id: &str,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        lawyer_id: &UserId,
    ) -> Result<(), GatewayError> {
        let channels: SharedCaseChannelGateway = Arc::clone(&self.channels);
        let guild: GuildId = guild_id.clone();
        let channel: ChannelId = channel_id.clone();
        let lawyer: UserId = lawyer_id.clone();
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("revoke channel access", 3, move || {
                channels
                    .revoke_access(&guild, &channel, &lawyer)
                    .map_err(|err| err.to_string())
            }),
        );
        self.channels.grant_access(guild_id, channel_id, lawyer_id)
    }

    /// Registers a grant as the undo, then revokes `lawyer_id` from the channel.
    fn revoke_access(
        &self,
        transaction_id: &str,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        lawyer_id: &UserId,
    ) -> Result<(), GatewayError> {
        let channels: SharedCaseChannelGateway = Arc::clone(&self.channels);
        let guild: GuildId = guild_id.clone();
        let channel: ChannelId = channel_id.clone();
        let lawyer: UserId = lawyer_id.clone();
        self.rollback.register_compensation_action(
            transaction_id,
            CompensationAction::new("restore channel access", 3, move || {
                channels
                    .grant_access(&guild, &channel, &lawyer)
                    .map_err(|err| err.to_string())
            }),
        );
        self.channels.revoke_access(guild_id, channel_id, lawyer_id)
    }

    fn load_config(
        &self,
        guild_id: &GuildId,
        failure: CoreError,
    ) -> Result<GuildConfig, CoreError> {
        self.guild_configs
            .ensure_guild_config(guild_id)
            .map_err(|err| {
                error!(guild_id = %guild_id, error = %err, "Guild config lookup failed");
                failure
            })
    }

    fn record(&self, case: &Case, action: AuditAction, actor_id: &UserId, details: AuditDetails) {
        let entry: AuditLogEntry = AuditLogEntry::new(
            case.guild_id.clone(),
            action,
            actor_id.clone(),
            Some(case.id.to_string()),
            details,
        );
        audit_trail::record(self.audit.as_ref(), &entry);
    }
}

/// Loads a case of `guild_id` that is still open, through the transaction.
fn load_open_case(
    uow: &dyn UnitOfWork,
    guild_id: &GuildId,
    case_id: CaseId,
) -> Result<Case, StepError> {
    let case: Case = uow
        .cases()
        .find_by_id(case_id)?
        .filter(|case| &case.guild_id == guild_id)
        .ok_or(CoreError::CaseNotFound)?;
    case.ensure_open().map_err(CoreError::from)?;
    Ok(case)
}

fn write_edit(uow: &dyn UnitOfWork, mut case: Case) -> Result<Case, StepError> {
    case.updated_at = OffsetDateTime::now_utc();
    Ok(uow
        .cases()
        .update(&case)?
        .ok_or(CoreError::AssignmentFailed)?)
}
