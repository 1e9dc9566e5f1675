// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the command layer.

use anarchy::{CoreError, RepositoryError};
use anarchy_domain::DomainError;
use tracing::error;

/// Command-level errors.
///
/// These are distinct from domain/core errors and represent what a command
/// handler shows the invoking member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The invoking member lacks a required permission.
    Unauthorized {
        /// The command that was attempted.
        action: String,
        /// Why it was refused.
        message: String,
    },
    /// One or more validation rules failed and no bypass applies.
    ValidationFailed {
        /// Every error reported by the failing rules, in rule order.
        errors: Vec<String>,
    },
    /// The guild owner may override the failing rules after confirming.
    ConfirmationRequired {
        /// Single-use token to pass to `confirm_bypass`.
        token: String,
        /// The errors the owner is asked to override.
        errors: Vec<String>,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The command could not complete.
    Internal {
        /// A message safe to show the member.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { action, message } => {
                write!(f, "Unauthorized: '{action}': {message}")
            }
            Self::ValidationFailed { errors } => {
                write!(f, "Validation failed: {}", errors.join("; "))
            }
            Self::ConfirmationRequired { errors, .. } => {
                write!(f, "Confirmation required: {}", errors.join("; "))
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// Parse failures become `InvalidInput` on the field that carried the value.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidStaffRole(_) => ApiError::InvalidInput {
            field: String::from("role"),
            message,
        },
        DomainError::InvalidStaffStatus(_) => ApiError::InvalidInput {
            field: String::from("status"),
            message,
        },
        DomainError::InvalidCaseStatus(_) => ApiError::InvalidInput {
            field: String::from("status"),
            message,
        },
        DomainError::InvalidCasePriority(_) => ApiError::InvalidInput {
            field: String::from("priority"),
            message,
        },
        DomainError::InvalidCaseResult(_) => ApiError::InvalidInput {
            field: String::from("result"),
            message,
        },
        DomainError::InvalidPermission(_) => ApiError::InvalidInput {
            field: String::from("permission"),
            message,
        },
        DomainError::InvalidCaseTitle(_) => ApiError::InvalidInput {
            field: String::from("title"),
            message,
        },
        DomainError::InvalidTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("case_lifecycle"),
            message,
        },
        DomainError::LeadAttorneyNotAssigned(_) => ApiError::DomainRuleViolation {
            rule: String::from("lead_attorney_assigned"),
            message,
        },
        DomainError::CaseClosed(_) => ApiError::DomainRuleViolation {
            rule: String::from("case_open"),
            message,
        },
        DomainError::InvalidRoleChange { .. } => ApiError::DomainRuleViolation {
            rule: String::from("role_change_direction"),
            message,
        },
    }
}

/// Translates a core error into an API error.
///
/// Storage failures are logged here and reported with a fixed message, so
/// no infrastructure detail reaches the member.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::CaseNotFound | CoreError::AssignmentFailed => ApiError::ResourceNotFound {
            resource_type: String::from("Case"),
            message: err.to_string(),
        },
        CoreError::StaffNotFound => ApiError::ResourceNotFound {
            resource_type: String::from("Staff member"),
            message: err.to_string(),
        },
        CoreError::InvalidCaseStatus { .. } => ApiError::DomainRuleViolation {
            rule: String::from("case_status"),
            message: err.to_string(),
        },
        CoreError::StaffAlreadyActive => ApiError::DomainRuleViolation {
            rule: String::from("unique_staff"),
            message: err.to_string(),
        },
        CoreError::CaseCreationFailed
        | CoreError::LawyerAssignmentFailed
        | CoreError::LawyerUnassignmentFailed
        | CoreError::LawyerReassignmentFailed
        | CoreError::CaseCloseFailed => ApiError::Internal {
            message: err.to_string(),
        },
        CoreError::Repository(repository_err) => translate_repository_error(&repository_err),
        CoreError::Domain(domain_err) => translate_domain_error(domain_err),
    }
}

fn translate_repository_error(err: &RepositoryError) -> ApiError {
    error!(error = %err, "Storage failure while handling command");
    match err {
        RepositoryError::Conflict(_) => ApiError::DomainRuleViolation {
            rule: String::from("unique"),
            message: String::from("The record was changed by another request, please retry"),
        },
        RepositoryError::NotConnected
        | RepositoryError::Storage(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::TransactionState(_) => ApiError::Internal {
            message: String::from("The command could not be completed, please try again later"),
        },
    }
}
