// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transaction-scoped repositories.
//!
//! A [`SqliteUnitOfWork`] holds the database connection lock from creation
//! until it is dropped, so nothing else can interleave statements with the
//! transaction. The flip side is that the thread owning a unit of work
//! must not use the standalone repositories of the same database until it
//! has been dropped.

use anarchy::{
    CaseCounterRepository, CaseRepository, RepositoryError, StaffRepository, UnitOfWork,
    UnitOfWorkFactory, new_transaction_id,
};
use anarchy_domain::{
    Case, CaseId, CaseNumber, CaseStatus, GuildId, NewCase, Staff, StaffRole, UserId,
};
use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use std::cell::RefCell;
use std::sync::{Arc, MutexGuard};
use tracing::{debug, warn};

use crate::database::Database;
use crate::error::PersistenceError;
use crate::{mutations, queries};

pub struct SqliteUnitOfWork<'a> {
    transaction_id: String,
    conn: RefCell<MutexGuard<'a, SqliteConnection>>,
    active: bool,
}

impl<'a> SqliteUnitOfWork<'a> {
    fn new(conn: MutexGuard<'a, SqliteConnection>) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            conn: RefCell::new(conn),
            active: false,
        }
    }

    fn run<T>(
        &self,
        operation: impl FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError>,
    ) -> Result<T, RepositoryError> {
        let mut conn = self.conn.borrow_mut();
        Ok(operation(&mut conn)?)
    }

    fn require_active(&self, step: &str) -> Result<(), RepositoryError> {
        if self.active {
            Ok(())
        } else {
            Err(RepositoryError::TransactionState(format!(
                "cannot {step}: no active transaction"
            )))
        }
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    fn begin(&mut self) -> Result<(), RepositoryError> {
        if self.active {
            return Err(RepositoryError::TransactionState(String::from(
                "transaction already active",
            )));
        }
        self.run(|conn| Ok(AnsiTransactionManager::begin_transaction(conn)?))?;
        self.active = true;
        debug!(transaction_id = %self.transaction_id, "Transaction started");
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RepositoryError> {
        self.require_active("commit")?;
        self.run(|conn| Ok(AnsiTransactionManager::commit_transaction(conn)?))?;
        self.active = false;
        debug!(transaction_id = %self.transaction_id, "Transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), RepositoryError> {
        self.require_active("roll back")?;
        self.active = false;
        self.run(|conn| Ok(AnsiTransactionManager::rollback_transaction(conn)?))?;
        debug!(transaction_id = %self.transaction_id, "Transaction rolled back");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn cases(&self) -> &dyn CaseRepository {
        self
    }

    fn staff(&self) -> &dyn StaffRepository {
        self
    }

    fn counters(&self) -> &dyn CaseCounterRepository {
        self
    }
}

impl Drop for SqliteUnitOfWork<'_> {
    fn drop(&mut self) {
        if self.active {
            warn!(
                transaction_id = %self.transaction_id,
                "Unit of work dropped mid-transaction, rolling back"
            );
            if let Err(err) = self.rollback() {
                warn!(transaction_id = %self.transaction_id, error = %err, "Rollback on drop failed");
            }
        }
    }
}

impl CaseRepository for SqliteUnitOfWork<'_> {
    fn find_by_id(&self, case_id: CaseId) -> Result<Option<Case>, RepositoryError> {
        self.run(|conn| queries::cases::find_by_id(conn, case_id))
    }

    fn find_by_client(&self, client_id: &UserId) -> Result<Vec<Case>, RepositoryError> {
        self.run(|conn| queries::cases::find_by_client(conn, client_id))
    }

    fn find_by_status(
        &self,
        guild_id: &GuildId,
        status: CaseStatus,
    ) -> Result<Vec<Case>, RepositoryError> {
        self.run(|conn| queries::cases::find_by_status(conn, guild_id, status))
    }

    fn find_by_lawyer(
        &self,
        guild_id: &GuildId,
        lawyer_id: &UserId,
    ) -> Result<Vec<Case>, RepositoryError> {
        self.run(|conn| queries::cases::find_by_lawyer(conn, guild_id, lawyer_id))
    }

    fn find_by_case_number(
        &self,
        guild_id: &GuildId,
        case_number: &CaseNumber,
    ) -> Result<Option<Case>, RepositoryError> {
        self.run(|conn| queries::cases::find_by_case_number(conn, guild_id, case_number))
    }

    fn add(&self, new_case: &NewCase) -> Result<Case, RepositoryError> {
        self.run(|conn| mutations::cases::insert_case(conn, new_case))
    }

    fn update(&self, case: &Case) -> Result<Option<Case>, RepositoryError> {
        self.run(|conn| mutations::cases::update_case(conn, case))
    }

    fn conditional_update_status(
        &self,
        case: &Case,
        expected: CaseStatus,
    ) -> Result<Option<Case>, RepositoryError> {
        self.run(|conn| mutations::cases::update_case_if_status(conn, case, expected))
    }
}

impl StaffRepository for SqliteUnitOfWork<'_> {
    fn find_by_user_id(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Staff>, RepositoryError> {
        self.run(|conn| queries::staff::find_by_user_id(conn, guild_id, user_id))
    }

    fn get_staff_count_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<u32, RepositoryError> {
        self.run(|conn| queries::staff::count_active_by_role(conn, guild_id, role))
    }

    fn find_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<Vec<Staff>, RepositoryError> {
        self.run(|conn| queries::staff::find_active_by_role(conn, guild_id, role))
    }

    fn find_active_staff(&self, guild_id: &GuildId) -> Result<Vec<Staff>, RepositoryError> {
        self.run(|conn| queries::staff::find_active(conn, guild_id))
    }

    fn add(&self, staff: &Staff) -> Result<Staff, RepositoryError> {
        self.run(|conn| mutations::staff::insert_staff(conn, staff))
    }

    fn update(&self, staff: &Staff) -> Result<Option<Staff>, RepositoryError> {
        self.run(|conn| mutations::staff::update_staff(conn, staff))
    }
}

impl CaseCounterRepository for SqliteUnitOfWork<'_> {
    fn get_next_case_number(&self, guild_id: &GuildId) -> Result<u32, RepositoryError> {
        self.run(|conn| mutations::counters::next_case_sequence(conn, guild_id))
    }
}

/// Creates units of work over one [`Database`].
pub struct SqliteUnitOfWorkFactory {
    database: Arc<Database>,
}

impl SqliteUnitOfWorkFactory {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl UnitOfWorkFactory for SqliteUnitOfWorkFactory {
    fn create(&self) -> Result<Box<dyn UnitOfWork + '_>, RepositoryError> {
        let conn: MutexGuard<'_, SqliteConnection> = self.database.lock()?;
        Ok(Box::new(SqliteUnitOfWork::new(conn)))
    }
}
