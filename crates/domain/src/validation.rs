// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The shared shape of every rule check and the fold that combines them.
//!
//! Rule checks never fail for an expected denial; they return a
//! [`ValidationResult`] with `valid == false` and user-facing errors.

use crate::error::DomainError;
use crate::staff::StaffRole;
use crate::types::UserId;
use std::collections::BTreeMap;

/// Maximum number of open (pending or in-progress) cases a client may hold in a guild.
pub const CLIENT_CASE_LIMIT: u32 = 5;

/// Open case count at which clients are warned they are approaching the limit.
pub const CLIENT_CASE_WARNING_THRESHOLD: u32 = 3;

const MAX_CASE_TITLE_CHARS: usize = 200;

/// Who may override a failed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BypassType {
    GuildOwner,
    Admin,
}

impl BypassType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GuildOwner => "guild-owner",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for BypassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single rule check or of several folded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Whether a privileged caller may override this failure.
    pub bypass_available: bool,
    pub bypass_type: Option<BypassType>,
    /// Free-form details for display and audit.
    pub metadata: BTreeMap<String, String>,
}

impl ValidationResult {
    /// A passing result with no messages.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            bypass_available: false,
            bypass_type: None,
            metadata: BTreeMap::new(),
        }
    }

    /// A failing result carrying a single error.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        let mut result: Self = Self::success();
        result.add_error(error);
        result
    }

    /// Records an error and marks the result invalid.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Marks the failure as overridable by `bypass_type`.
    #[must_use]
    pub const fn with_bypass(mut self, bypass_type: BypassType) -> Self {
        self.bypass_available = true;
        self.bypass_type = Some(bypass_type);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Folds many results into one.
///
/// Validity is the AND of all inputs, errors and warnings are concatenated
/// in input order, and bypass availability is the OR. When any input offers
/// a bypass the combined bypass type is always `guild-owner`.
/// Metadata from later results overwrites earlier keys.
#[must_use]
pub fn validate_multiple<I>(results: I) -> ValidationResult
where
    I: IntoIterator<Item = ValidationResult>,
{
    let mut combined: ValidationResult = ValidationResult::success();
    for result in results {
        combined.valid &= result.valid;
        combined.errors.extend(result.errors);
        combined.warnings.extend(result.warnings);
        combined.bypass_available |= result.bypass_available;
        combined.metadata.extend(result.metadata);
    }
    if combined.bypass_available {
        combined.bypass_type = Some(BypassType::GuildOwner);
    }
    combined
}

/// Result of a role hiring-cap check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLimitValidation {
    pub result: ValidationResult,
    pub role: StaffRole,
    pub current_count: u32,
    pub max_count: u32,
}

/// Result of a client open-case-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCaseLimitValidation {
    pub result: ValidationResult,
    pub client_id: UserId,
    pub current_count: u32,
    pub max_count: u32,
}

/// Result of a staff-membership and role-level check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffValidation {
    pub result: ValidationResult,
    pub is_active_staff: bool,
    pub current_role: Option<StaffRole>,
    pub has_required_permissions: bool,
}

/// Result of a named permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionValidation {
    pub result: ValidationResult,
    pub has_permission: bool,
    pub required_permission: String,
}

macro_rules! into_validation_result {
    ($($typed:ty),* $(,)?) => {
        $(
            impl From<$typed> for ValidationResult {
                fn from(value: $typed) -> Self {
                    value.result
                }
            }
        )*
    };
}

into_validation_result!(
    RoleLimitValidation,
    ClientCaseLimitValidation,
    StaffValidation,
    PermissionValidation,
);

/// Validates a case title supplied by a client.
///
/// # Errors
///
/// Returns an error if the title is blank or longer than 200 characters.
pub fn validate_case_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::InvalidCaseTitle(String::from(
            "Title cannot be empty",
        )));
    }
    if title.chars().count() > MAX_CASE_TITLE_CHARS {
        return Err(DomainError::InvalidCaseTitle(format!(
            "Title cannot exceed {MAX_CASE_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}
