// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening and preparing a `SQLite` connection.
//!
//! Queries and writes live in `queries/` and `mutations/`; nothing here
//! touches case or staff data.

use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Opens `database_url`, applies connection pragmas and brings the schema
/// up to date.
///
/// `file_backed` turns on WAL so readers do not block the single writer.
///
/// # Errors
///
/// Returns an error if the connection cannot be opened, a pragma fails,
/// foreign keys stay disabled, or a migration fails.
pub fn open_connection(
    database_url: &str,
    file_backed: bool,
) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, file_backed, "Opening SQLite database");
    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)?;

    // Diesel has no DSL for pragmas.
    pragma(&mut conn, "PRAGMA foreign_keys = ON")?;
    pragma(&mut conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))?;
    if file_backed {
        pragma(&mut conn, "PRAGMA journal_mode = WAL")?;
    }
    ensure_foreign_keys(&mut conn)?;

    let applied: usize = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| PersistenceError::MigrationFailed(err.to_string()))?
        .len();
    debug!(applied, "Migrations applied");

    Ok(conn)
}

fn pragma(conn: &mut SqliteConnection, statement: &str) -> Result<(), PersistenceError> {
    diesel::sql_query(statement)
        .execute(conn)
        .map_err(|err| PersistenceError::QueryFailed(format!("{statement}: {err}")))?;
    Ok(())
}

/// Reminders cascade off their case through a foreign key, so a connection
/// without enforcement is refused.
fn ensure_foreign_keys(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if row.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}
