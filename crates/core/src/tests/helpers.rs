// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory collaborators with call counting and failure injection.

use crate::{
    AuditSink, CaseChannelGateway, CaseCounterRepository, CaseRepository, ClientNotifier,
    GatewayError, GuildConfigRepository, ReminderRepository, RepositoryError, StaffRepository,
    UnitOfWork, UnitOfWorkFactory,
};
use anarchy_audit::{AuditAction, AuditLogEntry};
use anarchy_domain::{
    Case, CaseId, CaseNumber, CasePriority, CaseStatus, ChannelId, GuildConfig, GuildId, NewCase,
    NewReminder, PermissionContext, Reminder, ReminderId, RoleId, Staff, StaffRole, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

pub const GUILD: &str = "guild-1";
pub const OTHER_GUILD: &str = "guild-2";

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub staff: Vec<Staff>,
    pub cases: Vec<Case>,
    pub counters: HashMap<GuildId, u32>,
    pub configs: HashMap<GuildId, GuildConfig>,
    pub reminders: Vec<Reminder>,
    pub audit: Vec<AuditLogEntry>,
    next_case_id: i64,
    next_reminder_id: i64,
}

/// One store implementing every repository trait.
#[derive(Default)]
pub struct FakeStore {
    pub state: Mutex<StoreState>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashSet<&'static str>>,
    /// When set, the next case write first sees this status, as if another
    /// writer got there first.
    pub race_status: Mutex<Option<CaseStatus>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failures.lock().unwrap().insert(operation);
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn audit_actions(&self) -> Vec<AuditAction> {
        self.state
            .lock()
            .unwrap()
            .audit
            .iter()
            .map(|entry| entry.action)
            .collect()
    }

    pub fn case_count(&self) -> usize {
        self.state.lock().unwrap().cases.len()
    }

    pub fn stored_case(&self, case_id: CaseId) -> Option<Case> {
        self.state
            .lock()
            .unwrap()
            .cases
            .iter()
            .find(|case| case.id == case_id)
            .cloned()
    }

    pub fn set_config(&self, config: GuildConfig) {
        self.state
            .lock()
            .unwrap()
            .configs
            .insert(config.guild_id.clone(), config);
    }

    pub fn seed_staff(&self, user: &str, role: StaffRole) -> Staff {
        let staff: Staff = Staff::hire(
            GuildId::new(GUILD),
            UserId::new(user),
            role,
            UserId::new("owner"),
            OffsetDateTime::now_utc(),
        );
        self.state.lock().unwrap().staff.push(staff.clone());
        staff
    }

    pub fn seed_case(&self, guild: &str, client: &str, status: CaseStatus) -> Case {
        let mut state = self.state.lock().unwrap();
        state.next_case_id += 1;
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let sequence: u32 = u32::try_from(state.next_case_id).unwrap();
        let case: Case = Case {
            id: CaseId::new(state.next_case_id),
            guild_id: GuildId::new(guild),
            case_number: CaseNumber::generate(2026, sequence, client),
            client_id: UserId::new(client),
            client_username: client.to_string(),
            title: String::from("Seeded case"),
            description: String::from("Seeded for tests"),
            status,
            priority: CasePriority::Medium,
            assigned_lawyer_ids: Vec::new(),
            lead_attorney_id: None,
            documents: Vec::new(),
            notes: Vec::new(),
            result: None,
            result_notes: None,
            closed_by: None,
            closed_at: None,
            channel_id: None,
            created_at: now,
            updated_at: now,
        };
        state.cases.push(case.clone());
        case
    }

    pub fn put_case(&self, case: &Case) {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state.cases.iter_mut().find(|stored| stored.id == case.id) {
            *stored = case.clone();
        }
    }

    fn enter(&self, operation: &'static str) -> Result<(), RepositoryError> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        if self.failures.lock().unwrap().contains(operation) {
            return Err(RepositoryError::Storage(format!("injected failure: {operation}")));
        }
        Ok(())
    }
}

impl StaffRepository for FakeStore {
    fn find_by_user_id(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> Result<Option<Staff>, RepositoryError> {
        self.enter("staff.find_by_user_id")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .staff
            .iter()
            .find(|staff| &staff.guild_id == guild_id && &staff.user_id == user_id)
            .cloned())
    }

    fn get_staff_count_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<u32, RepositoryError> {
        self.enter("staff.count_by_role")?;
        Ok(u32::try_from(self.find_by_role(guild_id, role)?.len()).unwrap())
    }

    fn find_by_role(
        &self,
        guild_id: &GuildId,
        role: StaffRole,
    ) -> Result<Vec<Staff>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .staff
            .iter()
            .filter(|staff| &staff.guild_id == guild_id && staff.role == role && staff.is_active())
            .cloned()
            .collect())
    }

    fn find_active_staff(&self, guild_id: &GuildId) -> Result<Vec<Staff>, RepositoryError> {
        self.enter("staff.find_active")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .staff
            .iter()
            .filter(|staff| &staff.guild_id == guild_id && staff.is_active())
            .cloned()
            .collect())
    }

    fn add(&self, staff: &Staff) -> Result<Staff, RepositoryError> {
        self.enter("staff.add")?;
        self.state.lock().unwrap().staff.push(staff.clone());
        Ok(staff.clone())
    }

    fn update(&self, staff: &Staff) -> Result<Option<Staff>, RepositoryError> {
        self.enter("staff.update")?;
        let mut state = self.state.lock().unwrap();
        Ok(state
            .staff
            .iter_mut()
            .find(|stored| stored.guild_id == staff.guild_id && stored.user_id == staff.user_id)
            .map(|stored| {
                *stored = staff.clone();
                staff.clone()
            }))
    }
}

impl CaseRepository for FakeStore {
    fn find_by_id(&self, case_id: CaseId) -> Result<Option<Case>, RepositoryError> {
        self.enter("case.find_by_id")?;
        Ok(self.stored_case(case_id))
    }

    fn find_by_client(&self, client_id: &UserId) -> Result<Vec<Case>, RepositoryError> {
        self.enter("case.find_by_client")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .cases
            .iter()
            .filter(|case| &case.client_id == client_id)
            .cloned()
            .collect())
    }

    fn find_by_status(
        &self,
        guild_id: &GuildId,
        status: CaseStatus,
    ) -> Result<Vec<Case>, RepositoryError> {
        self.enter("case.find_by_status")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .cases
            .iter()
            .filter(|case| &case.guild_id == guild_id && case.status == status)
            .cloned()
            .collect())
    }

    fn find_by_lawyer(
        &self,
        guild_id: &GuildId,
        lawyer_id: &UserId,
    ) -> Result<Vec<Case>, RepositoryError> {
        self.enter("case.find_by_lawyer")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .cases
            .iter()
            .filter(|case| &case.guild_id == guild_id && case.has_lawyer(lawyer_id))
            .cloned()
            .collect())
    }

    fn find_by_case_number(
        &self,
        guild_id: &GuildId,
        case_number: &CaseNumber,
    ) -> Result<Option<Case>, RepositoryError> {
        self.enter("case.find_by_case_number")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .cases
            .iter()
            .find(|case| &case.guild_id == guild_id && &case.case_number == case_number)
            .cloned())
    }

    fn add(&self, new_case: &NewCase) -> Result<Case, RepositoryError> {
        self.enter("case.add")?;
        let mut state = self.state.lock().unwrap();
        if state.cases.iter().any(|case| {
            case.guild_id == new_case.guild_id && case.case_number == new_case.case_number
        }) {
            return Err(RepositoryError::Conflict(new_case.case_number.to_string()));
        }
        state.next_case_id += 1;
        let case: Case = Case {
            id: CaseId::new(state.next_case_id),
            guild_id: new_case.guild_id.clone(),
            case_number: new_case.case_number.clone(),
            client_id: new_case.client_id.clone(),
            client_username: new_case.client_username.clone(),
            title: new_case.title.clone(),
            description: new_case.description.clone(),
            status: CaseStatus::Pending,
            priority: new_case.priority,
            assigned_lawyer_ids: Vec::new(),
            lead_attorney_id: None,
            documents: Vec::new(),
            notes: Vec::new(),
            result: None,
            result_notes: None,
            closed_by: None,
            closed_at: None,
            channel_id: None,
            created_at: new_case.created_at,
            updated_at: new_case.created_at,
        };
        state.cases.push(case.clone());
        Ok(case)
    }

    fn update(&self, case: &Case) -> Result<Option<Case>, RepositoryError> {
        self.enter("case.update")?;
        let raced: Option<CaseStatus> = self.race_status.lock().unwrap().take();
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.cases.iter_mut().find(|stored| stored.id == case.id) else {
            return Ok(None);
        };
        if let Some(status) = raced {
            stored.status = status;
        }
        if stored.status != case.status {
            return Ok(None);
        }
        let mut edited: Case = case.clone();
        edited.result = stored.result;
        edited.result_notes = stored.result_notes.clone();
        edited.closed_by = stored.closed_by.clone();
        edited.closed_at = stored.closed_at;
        *stored = edited.clone();
        Ok(Some(edited))
    }

    fn conditional_update_status(
        &self,
        case: &Case,
        expected: CaseStatus,
    ) -> Result<Option<Case>, RepositoryError> {
        self.enter("case.conditional_update_status")?;
        let raced: Option<CaseStatus> = self.race_status.lock().unwrap().take();
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.cases.iter_mut().find(|stored| stored.id == case.id) else {
            return Ok(None);
        };
        if let Some(status) = raced {
            stored.status = status;
        }
        if stored.status != expected {
            return Ok(None);
        }
        *stored = case.clone();
        Ok(Some(case.clone()))
    }
}

impl CaseCounterRepository for FakeStore {
    fn get_next_case_number(&self, guild_id: &GuildId) -> Result<u32, RepositoryError> {
        self.enter("counter.next")?;
        let mut state = self.state.lock().unwrap();
        let sequence: &mut u32 = state.counters.entry(guild_id.clone()).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }
}

impl GuildConfigRepository for FakeStore {
    fn ensure_guild_config(&self, guild_id: &GuildId) -> Result<GuildConfig, RepositoryError> {
        self.enter("config.ensure")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .configs
            .entry(guild_id.clone())
            .or_insert_with(|| GuildConfig::new(guild_id.clone()))
            .clone())
    }

    fn update_guild_config(&self, config: &GuildConfig) -> Result<GuildConfig, RepositoryError> {
        self.enter("config.update")?;
        self.set_config(config.clone());
        Ok(config.clone())
    }
}

impl ReminderRepository for FakeStore {
    fn add_reminder(&self, reminder: &NewReminder) -> Result<Reminder, RepositoryError> {
        self.enter("reminder.add")?;
        let mut state = self.state.lock().unwrap();
        state.next_reminder_id += 1;
        let stored: Reminder = Reminder {
            id: ReminderId::new(state.next_reminder_id),
            guild_id: reminder.guild_id.clone(),
            user_id: reminder.user_id.clone(),
            case_id: reminder.case_id,
            message: reminder.message.clone(),
            scheduled_for: reminder.scheduled_for,
            is_active: true,
        };
        state.reminders.push(stored.clone());
        Ok(stored)
    }

    fn find_active_by_case(
        &self,
        guild_id: &GuildId,
        case_id: CaseId,
    ) -> Result<Vec<Reminder>, RepositoryError> {
        self.enter("reminder.find_active_by_case")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .reminders
            .iter()
            .filter(|reminder| {
                &reminder.guild_id == guild_id
                    && reminder.case_id == Some(case_id)
                    && reminder.is_active
            })
            .cloned()
            .collect())
    }

    fn deactivate(&self, reminder_id: ReminderId) -> Result<bool, RepositoryError> {
        self.enter("reminder.deactivate")?;
        let mut state = self.state.lock().unwrap();
        Ok(state
            .reminders
            .iter_mut()
            .find(|reminder| reminder.id == reminder_id && reminder.is_active)
            .map(|reminder| reminder.is_active = false)
            .is_some())
    }
}

impl AuditSink for FakeStore {
    fn log_action(&self, entry: &AuditLogEntry) -> Result<(), RepositoryError> {
        self.enter("audit.log")?;
        self.state.lock().unwrap().audit.push(entry.clone());
        Ok(())
    }
}

/// A unit of work that snapshots the store on begin and restores it on rollback.
pub struct FakeUnitOfWork {
    store: Arc<FakeStore>,
    transaction_id: String,
    snapshot: Option<StoreState>,
}

impl UnitOfWork for FakeUnitOfWork {
    fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    fn begin(&mut self) -> Result<(), RepositoryError> {
        if self.snapshot.is_some() {
            return Err(RepositoryError::TransactionState(String::from("already active")));
        }
        self.store.enter("uow.begin")?;
        self.snapshot = Some(self.store.state.lock().unwrap().clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RepositoryError> {
        if self.snapshot.is_none() {
            return Err(RepositoryError::TransactionState(String::from("not active")));
        }
        self.store.enter("uow.commit")?;
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), RepositoryError> {
        let Some(snapshot) = self.snapshot.take() else {
            return Err(RepositoryError::TransactionState(String::from("not active")));
        };
        self.store.enter("uow.rollback")?;
        *self.store.state.lock().unwrap() = snapshot;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    fn cases(&self) -> &dyn CaseRepository {
        self.store.as_ref()
    }

    fn staff(&self) -> &dyn StaffRepository {
        self.store.as_ref()
    }

    fn counters(&self) -> &dyn CaseCounterRepository {
        self.store.as_ref()
    }
}

pub struct FakeUnitOfWorkFactory {
    pub store: Arc<FakeStore>,
    created: AtomicUsize,
}

impl FakeUnitOfWorkFactory {
    pub fn new(store: Arc<FakeStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            created: AtomicUsize::new(0),
        })
    }
}

impl UnitOfWorkFactory for FakeUnitOfWorkFactory {
    fn create(&self) -> Result<Box<dyn UnitOfWork + '_>, RepositoryError> {
        self.store.enter("uow.create")?;
        let id: usize = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeUnitOfWork {
            store: Arc::clone(&self.store),
            transaction_id: format!("txn-{id}"),
            snapshot: None,
        }))
    }
}

/// Records every Discord call; individual operations can be made to fail.
#[derive(Default)]
pub struct FakeDiscord {
    pub calls: Mutex<Vec<String>>,
    failures: Mutex<HashSet<&'static str>>,
}

impl FakeDiscord {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.failures.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, operation: &'static str, detail: &str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(format!("{operation}:{detail}"));
        if self.failures.lock().unwrap().contains(operation) {
            return Err(GatewayError(format!("injected failure: {operation}")));
        }
        Ok(())
    }
}

impl CaseChannelGateway for FakeDiscord {
    fn create_case_channel(
        &self,
        case: &Case,
        _category_id: Option<&ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        self.enter("create_channel", case.case_number.as_str())?;
        Ok(ChannelId::new(&format!("channel-{}", case.id)))
    }

    fn delete_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError> {
        self.enter("delete_channel", channel_id.as_str())
    }

    fn archive_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        _archive_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        self.enter("archive_channel", channel_id.as_str())
    }

    fn restore_channel(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        _review_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        self.enter("restore_channel", channel_id.as_str())
    }

    fn grant_access(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        self.enter("grant_access", &format!("{channel_id}:{user_id}"))
    }

    fn revoke_access(
        &self,
        _guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        self.enter("revoke_access", &format!("{channel_id}:{user_id}"))
    }
}

impl ClientNotifier for FakeDiscord {
    fn notify_client(
        &self,
        _guild_id: &GuildId,
        client_id: &UserId,
        _message: &str,
    ) -> Result<(), GatewayError> {
        self.enter("notify_client", client_id.as_str())
    }
}

pub fn member_context(user: &str, roles: &[&str]) -> PermissionContext {
    PermissionContext::new(
        GuildId::new(GUILD),
        UserId::new(user),
        roles.iter().map(|role| RoleId::new(role)),
        false,
    )
}

pub fn owner_context() -> PermissionContext {
    PermissionContext::new(
        GuildId::new(GUILD),
        UserId::new("owner"),
        Vec::<RoleId>::new(),
        true,
    )
}
