// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{Case, CaseId, CaseNumber, CaseStatus, GuildId, UserId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::CaseRow;
use crate::diesel_schema::cases;
use crate::error::PersistenceError;

fn into_cases(rows: Vec<CaseRow>) -> Result<Vec<Case>, PersistenceError> {
    rows.into_iter().map(CaseRow::into_domain).collect()
}

/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the case does not exist.
pub fn find_by_id(
    conn: &mut SqliteConnection,
    case_id: CaseId,
) -> Result<Option<Case>, PersistenceError> {
    debug!(case_id = %case_id, "Looking up case");

    let row: Option<CaseRow> = cases::table
        .find(case_id.value())
        .select(CaseRow::as_select())
        .first(conn)
        .optional()?;

    row.map(CaseRow::into_domain).transpose()
}

/// Every case a client has opened, across all guilds.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_client(
    conn: &mut SqliteConnection,
    client_id: &UserId,
) -> Result<Vec<Case>, PersistenceError> {
    let rows: Vec<CaseRow> = cases::table
        .filter(cases::client_id.eq(client_id.as_str()))
        .order(cases::case_id.asc())
        .select(CaseRow::as_select())
        .load(conn)?;

    into_cases(rows)
}

/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_status(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    status: CaseStatus,
) -> Result<Vec<Case>, PersistenceError> {
    let rows: Vec<CaseRow> = cases::table
        .filter(cases::guild_id.eq(guild_id.as_str()))
        .filter(cases::status.eq(status.as_str()))
        .order(cases::case_id.asc())
        .select(CaseRow::as_select())
        .load(conn)?;

    into_cases(rows)
}

/// Cases in the guild that list `lawyer_id` among their assigned lawyers.
///
/// The JSON column is narrowed with `LIKE` and the match is confirmed on
/// the decoded list.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_lawyer(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    lawyer_id: &UserId,
) -> Result<Vec<Case>, PersistenceError> {
    let pattern: String = format!("%\"{lawyer_id}\"%");
    let rows: Vec<CaseRow> = cases::table
        .filter(cases::guild_id.eq(guild_id.as_str()))
        .filter(cases::assigned_lawyer_ids.like(pattern))
        .order(cases::case_id.asc())
        .select(CaseRow::as_select())
        .load(conn)?;

    Ok(into_cases(rows)?
        .into_iter()
        .filter(|case| case.has_lawyer(lawyer_id))
        .collect())
}

/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_case_number(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    case_number: &CaseNumber,
) -> Result<Option<Case>, PersistenceError> {
    let row: Option<CaseRow> = cases::table
        .filter(cases::guild_id.eq(guild_id.as_str()))
        .filter(cases::case_number.eq(case_number.as_str()))
        .select(CaseRow::as_select())
        .first(conn)
        .optional()?;

    row.map(CaseRow::into_domain).transpose()
}
