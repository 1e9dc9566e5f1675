// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{CaseId, GuildId, ReminderId, UserId};
use time::OffsetDateTime;

/// A scheduled reminder, optionally tied to a case.
///
/// Active reminders on a case block the case from being closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub case_id: Option<CaseId>,
    pub message: String,
    pub scheduled_for: OffsetDateTime,
    pub is_active: bool,
}

/// The data needed to insert a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub case_id: Option<CaseId>,
    pub message: String,
    pub scheduled_for: OffsetDateTime,
}
