// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Standalone repositories. Each call locks the shared connection for one
//! statement (or one short sequence) and runs outside any unit of work.

use anarchy::{
    AuditSink, CaseCounterRepository, CaseRepository, GuildConfigRepository, ReminderRepository,
    RepositoryError, SharedAuditSink, SharedCaseCounterRepository, SharedCaseRepository,
    SharedGuildConfigRepository, SharedReminderRepository, SharedStaffRepository,
    SharedUnitOfWorkFactory, StaffRepository,
};
use anarchy_audit::AuditLogEntry;
use anarchy_domain::{
    Case, CaseId, CaseNumber, CaseStatus, GuildConfig, GuildId, NewCase, NewReminder, Reminder,
    ReminderId, Staff, StaffRole, UserId,
};
use diesel::SqliteConnection;
use std::sync::Arc;

use crate::database::Database;
use crate::error::PersistenceError;
use crate::unit_of_work::SqliteUnitOfWorkFactory;
use crate::{mutations, queries};

fn run<T>(
    database: &Database,
    operation: impl FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError>,
) -> Result<T, RepositoryError> {
    Ok(database.with_connection(operation)?)
}

pub struct SqliteStaffRepository {
    database: Arc<Database>,
}

impl SqliteStaffRepository {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl StaffRepository for SqliteStaffRepository {
    fn find_by_user_id(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Staff>, RepositoryError> {
        run(&self.database, |conn| {
            queries::staff::find_by_user_id(conn, guild_id, user_id)
        })
    }

    fn get_staff_count_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<u32, RepositoryError> {
        run(&self.database, |conn| {
            queries::staff::count_active_by_role(conn, guild_id, role)
        })
    }

    fn find_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<Vec<Staff>, RepositoryError> {
        run(&self.database, |conn| {
            queries::staff::find_active_by_role(conn, guild_id, role)
        })
    }

    fn find_active_staff(&self, guild_id: &GuildId) -> Result<Vec<Staff>, RepositoryError> {
        run(&self.database, |conn| queries::staff::find_active(conn, guild_id))
    }

    fn add(&self, staff: &Staff) -> Result<Staff, RepositoryError> {
        run(&self.database, |conn| mutations::staff::insert_staff(conn, staff))
    }

    fn update(&self, staff: &Staff) -> Result<Option<Staff>, RepositoryError> {
        run(&self.database, |conn| mutations::staff::update_staff(conn, staff))
    }
}

pub struct SqliteCaseRepository {
    database: Arc<Database>,
}

impl SqliteCaseRepository {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl CaseRepository for SqliteCaseRepository {
    fn find_by_id(&self, case_id: CaseId) -> Result<Option<Case>, RepositoryError> {
        run(&self.database, |conn| queries::cases::find_by_id(conn, case_id))
    }

    fn find_by_client(&self, client_id: &UserId) -> Result<Vec<Case>, RepositoryError> {
        run(&self.database, |conn| {
            queries::cases::find_by_client(conn, client_id)
        })
    }

    fn find_by_status(
        &self,
        guild_id: &GuildId,
        status: CaseStatus,
    ) -> Result<Vec<Case>, RepositoryError> {
        run(&self.database, |conn| {
            queries::cases::find_by_status(conn, guild_id, status)
        })
    }

    fn find_by_lawyer(
        &self,
        guild_id: &GuildId,
        lawyer_id: &UserId,
    ) -> Result<Vec<Case>, RepositoryError> {
        run(&self.database, |conn| {
            queries::cases::find_by_lawyer(conn, guild_id, lawyer_id)
        })
    }

    fn find_by_case_number(
        &self,
        guild_id: &GuildId,
        case_number: &CaseNumber,
    ) -> Result<Option<Case>, RepositoryError> {
        run(&self.database, |conn| {
            queries::cases::find_by_case_number(conn, guild_id, case_number)
        })
    }

    fn add(&self, new_case: &NewCase) -> Result<Case, RepositoryError> {
        run(&self.database, |conn| mutations::cases::insert_case(conn, new_case))
    }

    fn update(&self, case: &Case) -> Result<Option<Case>, RepositoryError> {
        run(&self.database, |conn| mutations::cases::update_case(conn, case))
    }

    fn conditional_update_status(
        &self,
        case: &Case,
        expected: CaseStatus,
    ) -> Result<Option<Case>, RepositoryError> {
        run(&self.database, |conn| {
            mutations::cases::update_case_if_status(conn, case, expected)
        })
    }
}

pub struct SqliteCaseCounterRepository {
    database: Arc<Database>,
}

impl SqliteCaseCounterRepository {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl CaseCounterRepository for SqliteCaseCounterRepository {
    fn get_next_case_number(&self, guild_id: &GuildId) -> Result<u32, RepositoryError> {
        run(&self.database, |conn| {
            mutations::counters::next_case_sequence(conn, guild_id)
        })
    }
}

pub struct SqliteGuildConfigRepository {
    database: Arc<Database>,
}

impl SqliteGuildConfigRepository {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl GuildConfigRepository for SqliteGuildConfigRepository {
    fn ensure_guild_config(&self, guild_id: &GuildId) -> Result<GuildConfig, RepositoryError> {
        run(&self.database, |conn| {
            mutations::guild_config::ensure_guild_config(conn, guild_id)
        })
    }

    fn update_guild_config(&self, config: &GuildConfig) -> Result<GuildConfig, RepositoryError> {
        run(&self.database, |conn| {
            mutations::guild_config::update_guild_config(conn, config)
        })
    }
}

pub struct SqliteReminderRepository {
    database: Arc<Database>,
}

impl SqliteReminderRepository {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

impl ReminderRepository for SqliteReminderRepository {
    fn add_reminder(&self, reminder: &NewReminder) -> Result<Reminder, RepositoryError> {
        run(&self.database, |conn| {
            mutations::reminders::insert_reminder(conn, reminder)
        })
    }

    fn find_active_by_case(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
    ) -> Result<Vec<Reminder>, RepositoryError> {
        run(&self.database, |conn| {
            queries::reminders::find_active_by_case(conn, guild_id, case_id)
        })
    }

    fn deactivate(&self, reminder_id: ReminderId) -> Result<bool, RepositoryError> {
        run(&self.database, |conn| {
            mutations::reminders::deactivate_reminder(conn, reminder_id)
        })
    }
}

/// Audit sink writing to the `audit_log` table.
pub struct SqliteAuditSink {
    database: Arc<Database>,
}

impl SqliteAuditSink {
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// The most recent entries for a guild, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is not connected or the query fails.
    pub fn recent_entries(
        &self,
        guild_id: &GuildId,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        run(&self.database, |conn| {
            queries::audit::recent_entries(conn, guild_id, i64::from(limit))
        })
    }
}

impl AuditSink for SqliteAuditSink {
    fn log_action(&self, entry: &AuditLogEntry) -> Result<(), RepositoryError> {
        run(&self.database, |conn| {
            mutations::audit::insert_audit_entry(conn, entry)
        })
    }
}

/// Every repository over one database, typed for injection into services.
#[derive(Clone)]
pub struct Repositories {
    pub staff: SharedStaffRepository,
    pub cases: SharedCaseRepository,
    pub counters: SharedCaseCounterRepository,
    pub guild_configs: SharedGuildConfigRepository,
    pub reminders: SharedReminderRepository,
    pub audit: Arc<SqliteAuditSink>,
    pub unit_of_work_factory: SharedUnitOfWorkFactory,
}

impl Repositories {
    #[must_use]
    pub fn new(database: &Arc<Database>) -> Self {
        Self {
            staff: Arc::new(SqliteStaffRepository::new(Arc::clone(database))),
            cases: Arc::new(SqliteCaseRepository::new(Arc::clone(database))),
            counters: Arc::new(SqliteCaseCounterRepository::new(Arc::clone(database))),
            guild_configs: Arc::new(SqliteGuildConfigRepository::new(Arc::clone(database))),
            reminders: Arc::new(SqliteReminderRepository::new(Arc::clone(database))),
            audit: Arc::new(SqliteAuditSink::new(Arc::clone(database))),
            unit_of_work_factory: Arc::new(SqliteUnitOfWorkFactory::new(Arc::clone(database))),
        }
    }

    /// The audit sink as the trait object services take.
    #[must_use]
    pub fn audit_sink(&self) -> SharedAuditSink {
        self.audit.clone()
    }
}
