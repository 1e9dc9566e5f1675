// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::repository::RepositoryError;
use anarchy_domain::{CaseStatus, CaseTransition, DomainError};
use thiserror::Error;

/// Errors raised by the staff and case services.
///
/// Expected denials are reported as `ValidationResult`s and never appear
/// here. These errors mean an operation could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Case not found")]
    CaseNotFound,
    /// The case disappeared between read and write.
    #[error("Case not found or assignment failed")]
    AssignmentFailed,
    /// The case was not in the status the transition starts from.
    #[error("Case cannot be {} - current status: {status}", .transition.verb())]
    InvalidCaseStatus {
        transition: CaseTransition,
        status: CaseStatus,
    },
    #[error("Failed to create case")]
    CaseCreationFailed,
    #[error("Failed to assign lawyer")]
    LawyerAssignmentFailed,
    #[error("Failed to unassign lawyer")]
    LawyerUnassignmentFailed,
    #[error("Failed to reassign lawyer")]
    LawyerReassignmentFailed,
    #[error("Failed to close case")]
    CaseCloseFailed,
    #[error("Staff member not found")]
    StaffNotFound,
    #[error("User is already an active staff member")]
    StaffAlreadyActive,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
