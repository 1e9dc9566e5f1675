// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_domain::{GuildConfig, GuildId};
use diesel::prelude::*;
use diesel::SqliteConnection;
use time::OffsetDateTime;
use tracing::info;

use crate::data_models::{GuildConfigChanges, GuildConfigRow};
use crate::diesel_schema::guild_configs;
use crate::error::PersistenceError;
use crate::queries::guild_config::find_guild_config;

/// Returns the guild's configuration, creating an empty one first if
/// none exists.
///
/// # Errors
///
/// Returns an error if the database write or read fails.
pub fn ensure_guild_config(
    conn: &mut SqliteConnection,
    guild_id: &GuildId,
) -> Result<GuildConfig, PersistenceError> {
    let inserted: usize = diesel::insert_or_ignore_into(guild_configs::table)
        .values(guild_configs::guild_id.eq(guild_id.as_str()))
        .execute(conn)?;
    if inserted > 0 {
        info!(guild_id = %guild_id, "Created default guild configuration");
    }

    find_guild_config(conn, guild_id)?.ok_or_else(|| {
        PersistenceError::NotFound(format!("guild configuration for {guild_id}"))
    })
}

/// Replaces the stored configuration of `config`'s guild, creating the
/// row if needed.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn update_guild_config(
    conn: &mut SqliteConnection,
    config: &GuildConfig,
) -> Result<GuildConfig, PersistenceError> {
    ensure_guild_config(conn, &config.guild_id)?;

    let row: GuildConfigRow = diesel::update(guild_configs::table.find(config.guild_id.as_str()))
        .set(GuildConfigChanges::from_domain(config, OffsetDateTime::now_utc())?)
        .returning(GuildConfigRow::as_returning())
        .get_result(conn)?;

    info!(guild_id = %config.guild_id, "Updated guild configuration");
    row.into_domain()
}
