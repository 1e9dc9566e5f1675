// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::Staff;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::data_models::{StaffRecord, StaffRow};
use crate::diesel_schema::staff;
use crate::error::PersistenceError;

/// Inserts a staff record.
///
/// # Errors
///
/// Returns `UniqueViolation` if the user already has a record in the guild.
pub fn insert_staff(conn: &mut SqliteConnection, member: &Staff) -> Result<Staff, PersistenceError> {
    let row: StaffRow = diesel::insert_into(staff::table)
        .values(StaffRecord::from_domain(member)?)
        .returning(StaffRow::as_returning())
        .get_result(conn)?;

    info!(
        staff_id = row.staff_id,
        guild_id = %member.guild_id,
        user_id = %member.user_id,
        "Inserted staff record"
    );
    row.into_domain()
}

/// Overwrites the record for `member`'s guild and user.
///
/// # Errors
///
/// Returns an error if the database update fails.
/// Returns `Ok(None)` if no such record exists.
pub fn update_staff(
    conn: &mut SqliteConnection,
    member: &Staff,
) -> Result<Option<Staff>, PersistenceError> {
    let row: Option<StaffRow> = diesel::update(
        staff::table
            .filter(staff::guild_id.eq(member.guild_id.as_str()))
            .filter(staff::user_id.eq(member.user_id.as_str())),
    )
    .set(StaffRecord::from_domain(member)?)
    .returning(StaffRow::as_returning())
    .get_result(conn)
    .optional()?;

    row.map(StaffRow::into_domain).transpose()
}
