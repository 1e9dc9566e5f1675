// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{Case, CaseStatus, NewCase};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::data_models::{
    CaseChanges, CaseLifecycleChanges, CaseRow, NewCaseRecord, format_timestamp,
};
use crate::diesel_schema::cases;
use crate::error::PersistenceError;

/// Inserts a pending case with no lawyers, documents or notes.
///
/// # Errors
///
/// Returns `UniqueViolation` if the case number is already used in the guild.
pub fn insert_case(conn: &mut SqliteConnection, new_case: &NewCase) -> Result<Case, PersistenceError> {
    let created_at: String = format_timestamp(new_case.created_at)?;
    let record: NewCaseRecord<'_> = NewCaseRecord {
        guild_id: new_case.guild_id.as_str(),
        case_number: new_case.case_number.as_str(),
        client_id: new_case.client_id.as_str(),
        client_username: &new_case.client_username,
        title: &new_case.title,
        description: &new_case.description,
        status: CaseStatus::Pending.as_str(),
        priority: new_case.priority.as_str(),
        created_at: created_at.clone(),
        updated_at: created_at,
    };

    let row: CaseRow = diesel::insert_into(cases::table)
        .values(&record)
        .returning(CaseRow::as_returning())
        .get_result(conn)?;

    info!(
        case_id = row.case_id,
        guild_id = %new_case.guild_id,
        case_number = %new_case.case_number,
        "Inserted case"
    );
    row.into_domain()
}

/// Writes the editable columns of `case`, guarded by the status it was
/// read with.
///
/// Status and the closing fields are never written here, and a case whose
/// stored status no longer equals `case.status` is left untouched, so an
/// edit made from a stale read cannot undo an accept or a close.
///
/// # Errors
///
/// Returns an error if the database update fails.
/// Returns `Ok(None)` if the case is missing from its guild or its status
/// changed since it was read.
pub fn update_case(conn: &mut SqliteConnection, case: &Case) -> Result<Option<Case>, PersistenceError> {
    let row: Option<CaseRow> = diesel::update(
        cases::table
            .filter(cases::case_id.eq(case.id.value()))
            .filter(cases::guild_id.eq(case.guild_id.as_str()))
            .filter(cases::status.eq(case.status.as_str())),
    )
    .set(CaseChanges::from_domain(case)?)
    .returning(CaseRow::as_returning())
    .get_result(conn)
    .optional()?;

    if row.is_none() {
        debug!(case_id = %case.id, status = %case.status, "Case edit lost to a status change");
    }
    row.map(CaseRow::into_domain).transpose()
}

/// Writes `case` only if the stored status still equals `expected`.
///
/// The check and the write are one statement, so two callers racing on
/// the same expected status cannot both succeed.
///
/// # Errors
///
/// Returns an error if the database update fails.
/// Returns `Ok(None)` if the case is missing or its status changed.
pub fn update_case_if_status(
    conn: &mut SqliteConnection,
    case: &Case,
    expected: CaseStatus,
) -> Result<Option<Case>, PersistenceError> {
    let row: Option<CaseRow> = diesel::update(
        cases::table
            .filter(cases::case_id.eq(case.id.value()))
            .filter(cases::guild_id.eq(case.guild_id.as_str()))
            .filter(cases::status.eq(expected.as_str())),
    )
    .set((
        CaseChanges::from_domain(case)?,
        CaseLifecycleChanges::from_domain(case)?,
    ))
    .returning(CaseRow::as_returning())
    .get_result(conn)
    .optional()?;

    if row.is_none() {
        debug!(case_id = %case.id, expected = %expected, "Conditional status write lost");
    }
    row.map(CaseRow::into_domain).transpose()
}
