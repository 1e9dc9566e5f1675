// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Validation and case lifecycle services.
//!
//! Services receive their storage and Discord collaborators as trait
//! objects at construction time. Validation services report expected
//! denials as `ValidationResult`s; mutation services return [`CoreError`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod audit_trail;
mod business_rules;
mod case_service;
mod command_validation;
mod cross_entity;
mod error;
mod permission;
mod repository;
mod rollback;
mod staff_service;
mod transactional_case_service;

#[cfg(test)]
mod tests;

pub use audit_trail::record as record_audit;
pub use business_rules::BusinessRuleValidationService;
pub use case_service::{CaseRequest, CaseService};
pub use command_validation::{
    BypassRequest, CommandValidationResult, CommandValidationService, NamedRule,
    ValidationOutcome, ValidationPipeline, ValidationRule,
};
pub use cross_entity::{CrossEntityValidationService, EntityPayload, EntityType, Operation};
pub use error::CoreError;
pub use permission::{PermissionService, PermissionSummary};
pub use repository::{
    AuditSink, CaseChannelGateway, CaseCounterRepository, CaseRepository, ClientNotifier,
    GatewayError, GuildConfigRepository, ReminderRepository, RepositoryError,
    SharedAuditSink, SharedCaseChannelGateway, SharedCaseCounterRepository,
    SharedCaseRepository, SharedClientNotifier, SharedGuildConfigRepository,
    SharedReminderRepository, SharedStaffRepository, SharedUnitOfWorkFactory, StaffRepository,
    UnitOfWork, UnitOfWorkFactory, new_transaction_id,
};
pub use rollback::{
    CompensationAction, RollbackConfig, RollbackContext, RollbackReport, RollbackService,
};
pub use staff_service::StaffService;
pub use transactional_case_service::TransactionalCaseService;
