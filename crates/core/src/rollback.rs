// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Compensation registry for side effects that live outside the storage
//! transaction.
//!
//! An undo is registered against a transaction id before the risky step
//! runs. On failure the transaction is rolled back first and then every
//! registered compensation runs, highest priority first, each retried up to
//! the configured number of attempts. A compensation that keeps failing is
//! logged and skipped.

use crate::repository::UnitOfWork;
use anarchy_domain::{GuildId, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

type CompensationFn = Box<dyn FnMut() -> Result<(), String> + Send>;

/// An idempotent undo step.
pub struct CompensationAction {
    pub description: String,
    /// Higher runs earlier. Ties run in registration order.
    pub priority: u8,
    action: CompensationFn,
}

impl CompensationAction {
    pub fn new(
        description: impl Into<String>,
        priority: u8,
        action: impl FnMut() -> Result<(), String> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            priority,
            action: Box::new(action),
        }
    }
}

impl std::fmt::Debug for CompensationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompensationAction")
            .field("description", &self.description)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackConfig {
    /// Attempts per compensation, at least one.
    pub max_attempts: u32,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Why a transaction is being rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackContext {
    pub transaction_id: String,
    pub operation: String,
    pub guild_id: GuildId,
    pub actor_id: UserId,
    /// Internal failure description. Logged, never shown to users.
    pub error: String,
}

/// What happened during a rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub transaction_id: String,
    /// Whether the storage transaction was rolled back by this call.
    pub transaction_rolled_back: bool,
    /// Descriptions of compensations that eventually succeeded, in run order.
    pub compensations_succeeded: Vec<String>,
    /// Descriptions of compensations that failed every attempt.
    pub compensations_failed: Vec<String>,
}

pub struct RollbackService {
    config: RollbackConfig,
    registry: Mutex<HashMap<String, Vec<CompensationAction>>>,
}

impl RollbackService {
    #[must_use]
    pub fn new(config: RollbackConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_compensation_action(&self, transaction_id: &str, action: CompensationAction) {
        self.lock()
            .entry(transaction_id.to_string())
            .or_default()
            .push(action);
    }

    #[must_use]
    pub fn create_rollback_context(
        &self,
        transaction_id: &str,
        operation: &str,
        guild_id: &GuildId,
        actor_id: &UserId,
        error: &str,
    ) -> RollbackContext {
        RollbackContext {
            transaction_id: transaction_id.to_string(),
            operation: operation.to_string(),
            guild_id: guild_id.clone(),
            actor_id: actor_id.clone(),
            error: error.to_string(),
        }
    }

    /// Number of compensations waiting on a transaction.
    #[must_use]
    pub fn pending_compensations(&self, transaction_id: &str) -> usize {
        self.lock().get(transaction_id).map_or(0, Vec::len)
    }

    /// Discards the compensations of a transaction that committed.
    pub fn clear(&self, transaction_id: &str) {
        self.lock().remove(transaction_id);
    }

    /// Rolls back `unit_of_work` and runs the transaction's compensations.
    ///
    /// The unit of work is released before any compensation runs, so
    /// compensations may use storage themselves.
    pub fn perform_rollback(
        &self,
        mut unit_of_work: Box<dyn UnitOfWork + '_>,
        context: &RollbackContext,
    ) -> RollbackReport {
        error!(
            transaction_id = %context.transaction_id,
            guild_id = %context.guild_id,
            operation = %context.operation,
            error = %context.error,
            "Rolling back transaction"
        );

        let mut transaction_rolled_back: bool = false;
        if unit_of_work.is_active() {
            match unit_of_work.rollback() {
                Ok(()) => transaction_rolled_back = true,
                Err(err) => error!(
                    transaction_id = %context.transaction_id,
                    error = %err,
                    "Storage rollback failed"
                ),
            }
        }
        drop(unit_of_work);

        let mut actions: Vec<CompensationAction> = self
            .lock()
            .remove(&context.transaction_id)
            .unwrap_or_default();
        // Stable sort keeps registration order within a priority.
        actions.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut compensations_succeeded: Vec<String> = Vec::new();
        let mut compensations_failed: Vec<String> = Vec::new();
        for mut action in actions {
            if self.run_with_retries(&mut action, context) {
                compensations_succeeded.push(action.description);
            } else {
                compensations_failed.push(action.description);
            }
        }

        info!(
            transaction_id = %context.transaction_id,
            succeeded = compensations_succeeded.len(),
            failed = compensations_failed.len(),
            "Rollback complete"
        );
        RollbackReport {
            transaction_id: context.transaction_id.clone(),
            transaction_rolled_back,
            compensations_succeeded,
            compensations_failed,
        }
    }

    fn run_with_retries(&self, action: &mut CompensationAction, context: &RollbackContext) -> bool {
        let attempts: u32 = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match (action.action)() {
                Ok(()) => return true,
                Err(err) => warn!(
                    transaction_id = %context.transaction_id,
                    compensation = %action.description,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "Compensation attempt failed"
                ),
            }
        }
        error!(
            transaction_id = %context.transaction_id,
            compensation = %action.description,
            "Compensation abandoned"
        );
        false
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<CompensationAction>>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RollbackService {
    fn default() -> Self {
        Self::new(RollbackConfig::default())
    }
}
