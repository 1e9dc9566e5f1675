// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{GuildId, Staff, StaffRole, StaffStatus, UserId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::StaffRow;
use crate::diesel_schema::staff;
use crate::error::PersistenceError;

fn into_members(rows: Vec<StaffRow>) -> Result<Vec<Staff>, PersistenceError> {
    rows.into_iter().map(StaffRow::into_domain).collect()
}

/// Retrieves a staff record in any status.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user has never been staff in the guild.
pub fn find_by_user_id(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    user_id: &UserId,
) -> Result<Option<Staff>, PersistenceError> {
    debug!(guild_id = %guild_id, user_id = %user_id, "Looking up staff member");

    let row: Option<StaffRow> = staff::table
        .filter(staff::guild_id.eq(guild_id.as_str()))
        .filter(staff::user_id.eq(user_id.as_str()))
        .select(StaffRow::as_select())
        .first(conn)
        .optional()?;

    row.map(StaffRow::into_domain).transpose()
}

/// Counts active members holding `role`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_active_by_role(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    role: StaffRole,
) -> Result<u32, PersistenceError> {
    let count: i64 = staff::table
        .filter(staff::guild_id.eq(guild_id.as_str()))
        .filter(staff::role.eq(role.as_str()))
        .filter(staff::status.eq(StaffStatus::Active.as_str()))
        .count()
        .get_result(conn)?;

    u32::try_from(count).map_err(|e| PersistenceError::CorruptRow(e.to_string()))
}

/// Lists active members holding `role`, oldest hire first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_active_by_role(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    role: StaffRole,
) -> Result<Vec<Staff>, PersistenceError> {
    let rows: Vec<StaffRow> = staff::table
        .filter(staff::guild_id.eq(guild_id.as_str()))
        .filter(staff::role.eq(role.as_str()))
        .filter(staff::status.eq(StaffStatus::Active.as_str()))
        .order(staff::staff_id.asc())
        .select(StaffRow::as_select())
        .load(conn)?;

    into_members(rows)
}

/// Lists every active member of the guild.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_active(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
) -> Result<Vec<Staff>, PersistenceError> {
    let rows: Vec<StaffRow> = staff::table
        .filter(staff::guild_id.eq(guild_id.as_str()))
        .filter(staff::status.eq(StaffStatus::Active.as_str()))
        .order(staff::staff_id.asc())
        .select(StaffRow::as_select())
        .load(conn)?;

    into_members(rows)
}
