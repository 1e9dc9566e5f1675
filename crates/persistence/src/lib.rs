// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Anarchy & Associates bot.
//!
//! Implements every repository contract of the `anarchy` crate on `SQLite`
//! through Diesel.
//!
//! ## Layout
//!
//! - `queries/` and `mutations/` hold free functions taking a
//!   `&mut SqliteConnection`. They carry no transaction logic.
//! - [`repositories`] wraps them for standalone use; each call locks the
//!   shared connection of a [`Database`].
//! - [`unit_of_work`] wraps the same functions inside an explicit
//!   transaction that holds the connection until committed, rolled back
//!   or dropped.
//!
//! ## Concurrency guarantees
//!
//! - The per-guild case counter is a single upsert-and-return statement.
//! - Status transitions are conditional writes
//!   (`UPDATE ... WHERE status = expected`), so of two concurrent accepts
//!   of one case exactly one succeeds.
//! - Case numbers are unique per guild at the schema level.
//!
//! ## Testing
//!
//! Tests run against isolated shared-cache in-memory databases; see
//! [`Database::new_in_memory`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

pub mod backend;
pub mod data_models;
mod database;
pub mod diesel_schema;
mod error;
pub mod mutations;
pub mod queries;
pub mod repositories;
pub mod unit_of_work;

#[cfg(test)]
mod tests;

pub use database::Database;
pub use error::PersistenceError;
pub use repositories::{
    Repositories, SqliteAuditSink, SqliteCaseCounterRepository, SqliteCaseRepository,
    SqliteGuildConfigRepository, SqliteReminderRepository, SqliteStaffRepository,
};
pub use unit_of_work::{SqliteUnitOfWork, SqliteUnitOfWorkFactory};
