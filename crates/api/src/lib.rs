// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Command layer for the Anarchy & Associates bot.
//!
//! Slash-command invocations arrive already parsed into request structs
//! together with an [`InvocationContext`]. [`CommandHandlers`] validates
//! each one through a per-command rule pipeline, calls the matching
//! service, and translates failures into [`ApiError`]s fit to show the
//! invoking member.

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
#![allow(clippy::multiple_crate_versions)]

mod bypass;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use bypass::{BYPASS_TOKEN_TTL, BypassRegistry, PendingCommand};
pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use handlers::{CommandHandlers, HandlerDependencies};
pub use request_response::{
    AcceptCaseRequest, AddNoteRequest, CaseInfo, CaseLawyerRequest, ChangeRoleRequest,
    CloseCaseRequest, CommandResponse, ConfirmBypassRequest, ConfirmedCommand, CreateCaseRequest,
    DeclineCaseRequest, FireStaffRequest, GuildConfigInfo, HireStaffRequest, InvocationContext,
    ListCasesRequest, NoteInfo, PermissionFlagInfo, PermissionRolesInfo, PermissionSummaryInfo,
    ReassignLawyerRequest, ReassignmentInfo, StaffInfo, UpdateGuildConfigRequest,
    UpdatePriorityRequest,
};
