// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test fixtures: command handlers over an in-memory database and a
//! Discord stand-in that records every call.

use anarchy::{
    AuditSink, CaseChannelGateway, ClientNotifier, GatewayError, RepositoryError, RollbackConfig,
    SharedAuditSink,
};
use anarchy_audit::{AuditAction, AuditLogEntry};
use anarchy_domain::{
    Case, CaseId, ChannelId, GuildConfig, GuildId, NewReminder, PermissionName, Reminder, RoleId,
    Staff, StaffRole, UserId,
};
use anarchy_persistence::{Database, Repositories};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

use crate::{
    AcceptCaseRequest, CaseInfo, CommandHandlers, CreateCaseRequest, HandlerDependencies,
    InvocationContext,
};

pub const GUILD: &str = "guild-1";
pub const OTHER_GUILD: &str = "guild-2";

pub const OWNER: &str = "owner";
pub const SENIOR_ROLE: &str = "role-senior";
pub const LAWYER_ROLE: &str = "role-lawyer";
pub const LEAD_ROLE: &str = "role-lead";
pub const ADMIN_ROLE: &str = "role-admin";

#[derive(Default)]
pub struct RecordingDiscord {
    calls: Mutex<Vec<String>>,
}

impl RecordingDiscord {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CaseChannelGateway for RecordingDiscord {
    fn create_case_channel(
        &self,
        case: &Case,
        _category_id: Option<&ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        self.record(format!("create:{}", case.case_number));
        Ok(ChannelId::new(&format!("channel-{}", case.id)))
    }

    fn delete_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError> {
        self.record(format!("delete:{channel_id}"));
        Ok(())
    }

    fn archive_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        _archive_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        self.record(format!("archive:{channel_id}"));
        Ok(())
    }

    fn restore_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        _review_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        self.record(format!("restore:{channel_id}"));
        Ok(())
    }

    fn grant_access(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        self.record(format!("grant:{channel_id}:{user_id}"));
        Ok(())
    }

    fn revoke_access(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        self.record(format!("revoke:{channel_id}:{user_id}"));
        Ok(())
    }
}

impl ClientNotifier for RecordingDiscord {
    fn notify_client(
        &self,
        _guild_id: &GuildId,
        client_id: &UserId,
        _message: &str,
    ) -> Result<(), GatewayError> {
        self.record(format!("notify:{client_id}"));
        Ok(())
    }
}

/// An audit sink whose every write fails.
pub struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn log_action(&self, _entry: &AuditLogEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Storage(String::from("audit log unavailable")))
    }
}

pub struct TestHarness {
    pub handlers: CommandHandlers,
    pub repos: Repositories,
    pub discord: Arc<RecordingDiscord>,
    _database: Arc<Database>,
}

impl TestHarness {
    /// Fresh handlers over an empty database with role mappings for
    /// `GUILD` already configured.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Like [`Self::new`], with handlers writing audit entries to `audit`.
    pub fn with_audit_sink(audit: SharedAuditSink) -> Self {
        Self::build(Some(audit))
    }

    fn build(audit: Option<SharedAuditSink>) -> Self {
        let database: Arc<Database> = Arc::new(Database::new_in_memory());
        database.connect().expect("Failed to connect test database");
        let repos: Repositories = Repositories::new(&database);
        let discord: Arc<RecordingDiscord> = Arc::new(RecordingDiscord::default());

        let handlers: CommandHandlers = CommandHandlers::new(HandlerDependencies {
            staff: repos.staff.clone(),
            cases: repos.cases.clone(),
            counters: repos.counters.clone(),
            guild_configs: repos.guild_configs.clone(),
            reminders: repos.reminders.clone(),
            audit: audit.unwrap_or_else(|| repos.audit_sink()),
            unit_of_work_factory: repos.unit_of_work_factory.clone(),
            channels: discord.clone(),
            notifier: discord.clone(),
            rollback: RollbackConfig::default(),
        });

        let harness: Self = Self {
            handlers,
            repos,
            discord,
            _database: database,
        };
        harness.configure_roles();
        harness
    }

    fn configure_roles(&self) {
        let mut config: GuildConfig = GuildConfig::new(GuildId::new(GUILD));
        config.admin_roles.push(RoleId::new(ADMIN_ROLE));
        config.grant(PermissionName::SeniorStaff, RoleId::new(SENIOR_ROLE));
        config.grant(PermissionName::Lawyer, RoleId::new(LAWYER_ROLE));
        config.grant(PermissionName::Lawyer, RoleId::new(LEAD_ROLE));
        config.grant(PermissionName::LeadAttorney, RoleId::new(LEAD_ROLE));
        config.grant(PermissionName::Case, RoleId::new(LEAD_ROLE));
        config.case_review_category_id = Some(ChannelId::new("category-review"));
        config.case_archive_category_id = Some(ChannelId::new("category-archive"));
        self.repos
            .guild_configs
            .update_guild_config(&config)
            .expect("Failed to store guild config");
    }

    /// Inserts an active staff record directly, bypassing the handlers.
    pub fn seed_staff(&self, user: &str, role: StaffRole) -> Staff {
        let staff: Staff = Staff::hire(
            GuildId::new(GUILD),
            UserId::new(user),
            role,
            UserId::new(OWNER),
            OffsetDateTime::now_utc(),
        );
        self.repos.staff.add(&staff).expect("Failed to seed staff")
    }

    pub fn find_staff(&self, user: &str) -> Option<Staff> {
        self.repos
            .staff
            .find_by_user_id(&GuildId::new(GUILD), &UserId::new(user))
            .expect("Failed to load staff")
    }

    /// Opens a case through the handlers as `client`.
    pub fn open_case(&self, client: &str) -> CaseInfo {
        self.handlers
            .create_case(
                &member(client, &[]),
                &CreateCaseRequest {
                    client_username: format!("{client}-name"),
                    title: String::from("Contract dispute"),
                    description: String::from("Breach of a supply contract"),
                    priority: None,
                },
            )
            .expect("Failed to open case")
            .result
    }

    /// Opens a case as `client` and has `lawyer` accept it.
    pub fn open_accepted_case(&self, client: &str, lawyer: &str) -> CaseInfo {
        let case: CaseInfo = self.open_case(client);
        self.handlers
            .accept_case(
                &member(lawyer, &[LEAD_ROLE]),
                &AcceptCaseRequest {
                    case_id: case.case_id,
                },
            )
            .expect("Failed to accept case")
            .result
    }

    pub fn add_reminder(&self, case_id: i64) -> Reminder {
        self.repos
            .reminders
            .add_reminder(&NewReminder {
                guild_id: GuildId::new(GUILD),
                user_id: UserId::new("lawyer-1"),
                case_id: Some(CaseId::new(case_id)),
                message: String::from("File the motion"),
                scheduled_for: OffsetDateTime::now_utc(),
            })
            .expect("Failed to add reminder")
    }

    /// Audit actions recorded for `GUILD`, oldest first.
    pub fn audit_actions(&self) -> Vec<AuditAction> {
        let mut entries: Vec<AuditLogEntry> = self
            .repos
            .audit
            .recent_entries(&GuildId::new(GUILD), 100)
            .expect("Failed to read audit log");
        entries.reverse();
        entries.into_iter().map(|entry| entry.action).collect()
    }
}

pub fn member(user: &str, roles: &[&str]) -> InvocationContext {
    InvocationContext {
        guild_id: String::from(GUILD),
        user_id: String::from(user),
        roles: roles.iter().map(ToString::to_string).collect(),
        is_guild_owner: false,
    }
}

pub fn owner() -> InvocationContext {
    InvocationContext {
        guild_id: String::from(GUILD),
        user_id: String::from(OWNER),
        roles: Vec::new(),
        is_guild_owner: true,
    }
}
