// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::GuildId;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::diesel_schema::case_counters;
use crate::error::PersistenceError;

/// Reserves the next case sequence number for a guild, starting at 1.
///
/// The increment is a single upsert, so concurrent callers always receive
/// distinct values. Inside a transaction the reservation is undone by a
/// rollback.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn next_case_sequence(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
) -> Result<u32, PersistenceError> {
    let sequence: i32 = diesel::insert_into(case_counters::table)
        .values((
            case_counters::guild_id.eq(guild_id.as_str()),
            case_counters::sequence.eq(1),
        ))
        .on_conflict(case_counters::guild_id)
        .do_update()
        .set(case_counters::sequence.eq(case_counters::sequence + 1))
        .returning(case_counters::sequence)
        .get_result(conn)?;

    debug!(guild_id = %guild_id, sequence, "Reserved case sequence");
    u32::try_from(sequence).map_err(|e| PersistenceError::CorruptRow(e.to_string()))
}
