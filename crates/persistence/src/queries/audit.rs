// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_audit::AuditLogEntry;
use anarchy_domain::GuildId;
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::AuditLogRow;
use crate::diesel_schema::audit_log;
use crate::error::PersistenceError;

/// The most recent audit entries for a guild, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row does not parse.
pub fn recent_entries(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
    limit: i64,
) -> Result<Vec<AuditLogEntry>, PersistenceError> {
    let rows: Vec<AuditLogRow> = audit_log::table
        .filter(audit_log::guild_id.eq(guild_id.as_str()))
        .order(audit_log::audit_id.desc())
        .limit(limit)
        .select(AuditLogRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditLogRow::into_domain).collect()
}
