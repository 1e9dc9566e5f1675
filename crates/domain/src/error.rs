// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::case::CaseStatus;
use crate::types::UserId;

/// Errors that can occur during domain parsing and invariant checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Staff role string is not one of the known roles.
    InvalidStaffRole(String),
    /// Staff status string is not recognized.
    InvalidStaffStatus(String),
    /// Case status string is not recognized.
    InvalidCaseStatus(String),
    /// Case priority string is not recognized.
    InvalidCasePriority(String),
    /// Case result string is not recognized.
    InvalidCaseResult(String),
    /// Permission name is not recognized.
    InvalidPermission(String),
    /// Case title is empty or too long.
    InvalidCaseTitle(String),
    /// A lifecycle edge that the case state machine does not permit.
    InvalidTransition {
        /// The status the case is currently in.
        from: CaseStatus,
        /// The status that was requested.
        to: CaseStatus,
    },
    /// The lead attorney must be one of the assigned lawyers.
    LeadAttorneyNotAssigned(UserId),
    /// The case is closed and can no longer be modified.
    CaseClosed(String),
    /// A promotion or demotion that does not move in the requested direction.
    InvalidRoleChange {
        /// The role currently held.
        from: String,
        /// The requested role.
        to: String,
        /// Either `promotion` or `demotion`.
        direction: &'static str,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStaffRole(role) => write!(f, "Invalid staff role: {role}"),
            Self::InvalidStaffStatus(status) => write!(f, "Invalid staff status: {status}"),
            Self::InvalidCaseStatus(status) => write!(f, "Invalid case status: {status}"),
            Self::InvalidCasePriority(priority) => {
                write!(f, "Invalid case priority: {priority}")
            }
            Self::InvalidCaseResult(result) => write!(f, "Invalid case result: {result}"),
            Self::InvalidPermission(name) => write!(f, "Unknown permission: {name}"),
            Self::InvalidCaseTitle(msg) => write!(f, "Invalid case title: {msg}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "Case cannot move from {from} to {to}")
            }
            Self::LeadAttorneyNotAssigned(user_id) => {
                write!(
                    f,
                    "Lawyer {user_id} must be assigned to the case before becoming lead attorney"
                )
            }
            Self::CaseClosed(case_number) => {
                write!(f, "Case {case_number} is closed and cannot be modified")
            }
            Self::InvalidRoleChange {
                from,
                to,
                direction,
            } => {
                write!(f, "Changing role from {from} to {to} is not a {direction}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
