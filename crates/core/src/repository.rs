// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Storage and side-effect contracts consumed by the services.
//!
//! Repositories are guild-scoped CRUD with no business logic. Every method
//! takes `&self`; implementations use interior mutability. The shared
//! aliases add `Send + Sync` for handles stored inside services, while
//! transaction-scoped handles borrowed from a [`UnitOfWork`] need not be
//! thread-safe.

use anarchy_audit::AuditLogEntry;
use anarchy_domain::{
    Case, CaseId, CaseNumber, CaseStatus, ChannelId, GuildConfig, GuildId, NewCase, NewReminder,
    Reminder, ReminderId, Staff, StaffRole, UserId,
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The shared connection was used before `connect()`.
    #[error("Database is not connected")]
    NotConnected,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// `begin`, `commit` or `rollback` was called in the wrong state.
    #[error("Transaction error: {0}")]
    TransactionState(String),
}

/// Failures reported by the Discord side-effect collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Discord operation failed: {0}")]
pub struct GatewayError(pub String);

pub trait StaffRepository {
    /// Finds the staff record for a user in a guild, active or terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_user_id(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Staff>, RepositoryError>;

    /// Counts active staff holding `role` in a guild.
    ///
    /// # Errors
    ///
    /// Returns an error if the count fails.
    fn get_staff_count_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<u32, RepositoryError>;

    /// Active staff holding `role`, oldest hire first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_role(&self, guild_id: &GuildId, role: StaffRole)
    -> Result<Vec<Staff>, RepositoryError>;

    /// All active staff in a guild, highest role first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_active_staff(&self, guild_id: &GuildId) -> Result<Vec<Staff>, RepositoryError>;

    /// Inserts a new staff record.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the user already has a record in the guild.
    fn add(&self, staff: &Staff) -> Result<Staff, RepositoryError>;

    /// Overwrites an existing record keyed by guild and user.
    ///
    /// Returns `None` if no such record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update(&self, staff: &Staff) -> Result<Option<Staff>, RepositoryError>;
}

pub trait CaseRepository {
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_id(&self, case_id: CaseId) -> Result<Option<Case>, RepositoryError>;

    /// Every case filed by a client, across all guilds.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_client(&self, client_id: &UserId) -> Result<Vec<Case>, RepositoryError>;

    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_status(
        &self,
        guild_id: &GuildId,
        status: CaseStatus,
    ) -> Result<Vec<Case>, RepositoryError>;

    /// Cases in a guild that list `lawyer_id` among their assigned lawyers.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_lawyer(
        &self,
        guild_id: &GuildId,
        lawyer_id: &UserId,
    ) -> Result<Vec<Case>, RepositoryError>;

    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_by_case_number(
        &self,
        guild_id: &GuildId,
        case_number: &CaseNumber,
    ) -> Result<Option<Case>, RepositoryError>;

    /// Inserts a pending case and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the case number already exists in the guild.
    fn add(&self, new_case: &NewCase) -> Result<Case, RepositoryError>;

    /// Writes the editable fields of a case keyed by id.
    ///
    /// Status and the closing fields are left as stored, and the write only
    /// lands while the stored status still equals `case.status`. Returns
    /// `None` if the case no longer exists or its status has moved on.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update(&self, case: &Case) -> Result<Option<Case>, RepositoryError>;

    /// Overwrites the case only if its stored status is still `expected`.
    ///
    /// This is a single conditional write. Returns `None` when the case is
    /// missing or its status has moved on; exactly one of several racing
    /// callers with the same `expected` status gets `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn conditional_update_status(
        &self,
        case: &Case,
        expected: CaseStatus,
    ) -> Result<Option<Case>, RepositoryError>;
}

pub trait CaseCounterRepository {
    /// Atomically increments and returns the guild's case sequence.
    ///
    /// The first call for a guild returns 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment fails.
    fn get_next_case_number(&self, guild_id: &GuildId) -> Result<u32, RepositoryError>;
}

pub trait GuildConfigRepository {
    /// Loads the guild's configuration, creating an empty one if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or insert fails.
    fn ensure_guild_config(&self, guild_id: &GuildId) -> Result<GuildConfig, RepositoryError>;

    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update_guild_config(&self, config: &GuildConfig) -> Result<GuildConfig, RepositoryError>;
}

pub trait ReminderRepository {
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn add_reminder(&self, reminder: &NewReminder) -> Result<Reminder, RepositoryError>;

    /// Active reminders attached to a case.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn find_active_by_case(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
    ) -> Result<Vec<Reminder>, RepositoryError>;

    /// Marks a reminder as resolved. Returns `false` if it was not active.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn deactivate(&self, reminder_id: ReminderId) -> Result<bool, RepositoryError>;
}

/// Where audit entries go. Callers treat failures as non-fatal.
pub trait AuditSink {
    /// # Errors
    ///
    /// Returns an error if the entry could not be stored.
    fn log_action(&self, entry: &AuditLogEntry) -> Result<(), RepositoryError>;
}

/// Discord channel side effects for case channels.
///
/// None of these are part of the storage transaction.
pub trait CaseChannelGateway {
    /// Creates the private channel for a case under the review category.
    ///
    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn create_case_channel(
        &self,
        case: &Case,
        category_id: Option<&ChannelId>,
    ) -> Result<ChannelId, GatewayError>;

    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn delete_channel(&self, guild_id: &GuildId, channel_id: &ChannelId)
    -> Result<(), GatewayError>;

    /// Moves a channel into the archive category and locks it.
    ///
    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn archive_channel(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        archive_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError>;

    /// Undoes [`CaseChannelGateway::archive_channel`].
    ///
    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn restore_channel(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        review_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError>;

    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn grant_access(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError>;

    /// # Errors
    ///
    /// Returns an error if Discord rejects the request.
    fn revoke_access(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError>;
}

/// Direct messages to clients.
pub trait ClientNotifier {
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    fn notify_client(
        &self,
        guild_id: &GuildId,
        client_id: &UserId,
        message: &str,
    ) -> Result<(), GatewayError>;
}

/// A storage transaction with transaction-bound repository handles.
///
/// Dropping an active unit of work rolls it back.
pub trait UnitOfWork {
    fn transaction_id(&self) -> &str;

    /// # Errors
    ///
    /// Returns `TransactionState` if a transaction is already active.
    fn begin(&mut self) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Returns `TransactionState` if no transaction is active, or the
    /// storage error if the commit itself fails.
    fn commit(&mut self) -> Result<(), RepositoryError>;

    /// # Errors
    ///
    /// Returns `TransactionState` if no transaction is active.
    fn rollback(&mut self) -> Result<(), RepositoryError>;

    fn is_active(&self) -> bool;

    fn cases(&self) -> &dyn CaseRepository;

    fn staff(&self) -> &dyn StaffRepository;

    fn counters(&self) -> &dyn CaseCounterRepository;
}

pub trait UnitOfWorkFactory {
    /// Opens a new, not yet begun, unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available.
    fn create(&self) -> Result<Box<dyn UnitOfWork + '_>, RepositoryError>;
}

/// Builds a unique transaction id.
#[must_use]
pub fn new_transaction_id() -> String {
    let timestamp: i128 = OffsetDateTime::now_utc().unix_timestamp_nanos();
    format!("txn_{timestamp}_{}", rand::random::<u64>())
}

pub type SharedStaffRepository = Arc<dyn StaffRepository + Send + Sync>;
pub type SharedCaseRepository = Arc<dyn CaseRepository + Send + Sync>;
pub type SharedCaseCounterRepository = Arc<dyn CaseCounterRepository + Send + Sync>;
pub type SharedGuildConfigRepository = Arc<dyn GuildConfigRepository + Send + Sync>;
pub type SharedReminderRepository = Arc<dyn ReminderRepository + Send + Sync>;
pub type SharedAuditSink = Arc<dyn AuditSink + Send + Sync>;
pub type SharedCaseChannelGateway = Arc<dyn CaseChannelGateway + Send + Sync>;
pub type SharedClientNotifier = Arc<dyn ClientNotifier + Send + Sync>;
pub type SharedUnitOfWorkFactory = Arc<dyn UnitOfWorkFactory + Send + Sync>;
