// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{GuildConfig, GuildId};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::GuildConfigRow;
use crate::diesel_schema::guild_configs;
use crate::error::PersistenceError;

/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the guild has no configuration yet.
pub fn find_guild_config(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
) -> Result<Option<GuildConfig>, PersistenceError> {
    let row: Option<GuildConfigRow> = guild_configs::table
        .find(guild_id.as_str())
        .select(GuildConfigRow::as_select())
        .first(conn)
        .optional()?;

    row.map(GuildConfigRow::into_domain).transpose()
}
