// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{NewReminder, Reminder, ReminderId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::data_models::{ReminderRow, format_timestamp};
use crate::diesel_schema::reminders;
use crate::error::PersistenceError;

/// # Errors
///
/// Returns an error if the database write fails, including when the
/// referenced case does not exist.
pub fn insert_reminder(
    conn: &mut SqliteConnection,
    reminder: &NewReminder,
) -> Result<Reminder, PersistenceError> {
    let row: ReminderRow = diesel::insert_into(reminders::table)
        .values((
            reminders::guild_id.eq(reminder.guild_id.as_str()),
            reminders::user_id.eq(reminder.user_id.as_str()),
            reminders::case_id.eq(reminder.case_id.map(|case_id| case_id.value())),
            reminders::message.eq(&reminder.message),
            reminders::scheduled_for.eq(format_timestamp(reminder.scheduled_for)?),
            reminders::is_active.eq(1),
        ))
        .returning(ReminderRow::as_returning())
        .get_result(conn)?;

    info!(reminder_id = row.reminder_id, guild_id = %reminder.guild_id, "Inserted reminder");
    row.into_domain()
}

/// Marks a reminder resolved.
///
/// # Errors
///
/// Returns an error if the database write fails.
/// Returns `Ok(false)` if the reminder is missing or already inactive.
pub fn deactivate_reminder(
    conn: &mut SqliteConnection,
    reminder_id: ReminderId,
) -> Result<bool, PersistenceError> {
    let updated: usize = diesel::update(
        reminders::table
            .filter(reminders::reminder_id.eq(reminder_id.value()))
            .filter(reminders::is_active.eq(1)),
    )
    .set(reminders::is_active.eq(0))
    .execute(conn)?;

    Ok(updated > 0)
}
