// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_audit::AuditLogEntry;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::format_timestamp;
use crate::diesel_schema::audit_log;
use crate::error::PersistenceError;

/// Appends an entry to the audit log. Entries are never updated.
///
/// # Errors
///
/// Returns an error if the details cannot be serialized or the insert fails.
pub fn insert_audit_entry(
    conn: &mut SqliteConnection,
    entry: &AuditLogEntry,
) -> Result<(), PersistenceError> {
    let details_json: String = serde_json::to_string(&entry.details)?;

    diesel::insert_into(audit_log::table)
        .values((
            audit_log::guild_id.eq(entry.guild_id.as_str()),
            audit_log::action.eq(entry.action.as_str()),
            audit_log::actor_id.eq(entry.actor_id.as_str()),
            audit_log::target_id.eq(entry.target_id.as_deref()),
            audit_log::details_json.eq(&details_json),
            audit_log::created_at.eq(format_timestamp(entry.timestamp)?),
        ))
        .execute(conn)?;

    debug!(guild_id = %entry.guild_id, action = %entry.action, "Wrote audit entry");
    Ok(())
}
