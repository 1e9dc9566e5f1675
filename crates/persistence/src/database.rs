// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::info;

use crate::backend;
use crate::error::PersistenceError;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, so
/// concurrently running tests never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageKind {
    InMemory,
    File,
}

/// A lazily connected `SQLite` database.
///
/// Construction does no I/O. `connect()` opens the connection, enables
/// foreign keys, runs embedded migrations and, for file databases, turns
/// on WAL mode. Every use before that fails with
/// [`PersistenceError::NotConnected`].
///
/// All repositories built on one `Database` share its single connection.
pub struct Database {
    url: String,
    kind: StorageKind,
    conn: OnceLock<Mutex<SqliteConnection>>,
}

impl Database {
    /// A file-backed database at `path`.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            url: path.to_string(),
            kind: StorageKind::File,
            conn: OnceLock::new(),
        }
    }

    /// A private shared-cache in-memory database.
    #[must_use]
    pub fn new_in_memory() -> Self {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self {
            url: format!("file:anarchy_memdb_{db_id}?mode=memory&cache=shared"),
            kind: StorageKind::InMemory,
            conn: OnceLock::new(),
        }
    }

    /// Opens the connection. Calling this on a connected database does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened, migrations
    /// fail, or foreign keys cannot be enforced.
    pub fn connect(&self) -> Result<(), PersistenceError> {
        if self.is_connected() {
            return Ok(());
        }

        let conn: SqliteConnection =
            backend::open_connection(&self.url, self.kind == StorageKind::File)?;

        // A concurrent connect may have won; its connection is kept and ours dropped.
        if self.conn.set(Mutex::new(conn)).is_ok() {
            info!(url = %self.url, "Database connected");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Locks the shared connection.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` before `connect()` has succeeded.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, SqliteConnection>, PersistenceError> {
        let conn: &Mutex<SqliteConnection> =
            self.conn.get().ok_or(PersistenceError::NotConnected)?;
        Ok(conn.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Runs `operation` with exclusive use of the connection.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` before `connect()`, otherwise whatever
    /// `operation` returns.
    pub fn with_connection<T>(
        &self,
        operation: impl FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut conn: MutexGuard<'_, SqliteConnection> = self.lock()?;
        operation(&mut conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
