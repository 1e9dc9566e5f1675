// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{CaseId, GuildId, Reminder};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::ReminderRow;
use crate::diesel_schema::reminders;
use crate::error::PersistenceError;

/// Active reminders attached to a case, soonest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_active_by_case(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    case_id: CaseId,
) -> Result<Vec<Reminder>, PersistenceError> {
    let rows: Vec<ReminderRow> = reminders::table
        .filter(reminders::guild_id.eq(guild_id.as_str()))
        .filter(reminders::case_id.eq(case_id.value()))
        .filter(reminders::is_active.eq(1))
        .order(reminders::scheduled_for.asc())
        .select(ReminderRow::as_select())
        .load(conn)?;

    rows.into_iter().map(ReminderRow::into_domain).collect()
}
