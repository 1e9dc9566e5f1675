// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain types and rule primitives for the Anarchy & Associates bot.
//!
//! Nothing in this crate performs I/O. Services in the `anarchy` crate
//! load records through repository traits and evaluate them with the
//! types and pure functions defined here.

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

mod case;
mod error;
mod guild_config;
mod reminder;
mod staff;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use case::{
    Case, CaseDocument, CaseNote, CaseNumber, CasePriority, CaseResult, CaseStatus,
    CaseTransition, NewCase, sanitize_client_username,
};
pub use error::DomainError;
pub use guild_config::{GuildConfig, PermissionName};
pub use reminder::{NewReminder, Reminder};
pub use staff::{Staff, StaffRole, StaffStatus, staff_level};
pub use types::{CaseId, ChannelId, GuildId, PermissionContext, ReminderId, RoleId, UserId};
pub use validation::{
    BypassType, CLIENT_CASE_LIMIT, CLIENT_CASE_WARNING_THRESHOLD, ClientCaseLimitValidation,
    PermissionValidation, RoleLimitValidation, StaffValidation, ValidationResult,
    validate_case_title, validate_multiple,
};
