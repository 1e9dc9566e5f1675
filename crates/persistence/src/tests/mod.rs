// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod staff_repository_tests;
mod unit_of_work_tests;

use crate::{Database, Repositories};
use anarchy_domain::{
    CaseNumber, CasePriority, GuildId, NewCase, Staff, StaffRole, UserId,
};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

pub const GUILD: &str = "guild-1";

/// A connected, migrated in-memory database of its own.
pub fn create_test_database() -> Arc<Database> {
    let database: Arc<Database> = Arc::new(Database::new_in_memory());
    database.connect().expect("Failed to connect test database");
    database
}

pub fn create_test_repositories() -> (Arc<Database>, Repositories) {
    let database: Arc<Database> = create_test_database();
    let repositories: Repositories = Repositories::new(&database);
    (database, repositories)
}

/// A fixed timestamp with sub-second precision, to catch lossy storage.
pub fn fixed_time() -> OffsetDateTime {
    datetime!(2026-03-14 09:26:53.589_793 UTC)
}

pub fn new_case(guild: &str, sequence: u32, client: &str) -> NewCase {
    NewCase {
        guild_id: GuildId::new(guild),
        case_number: CaseNumber::generate(2026, sequence, client),
        client_id: UserId::new(client),
        client_username: client.to_string(),
        title: String::from("Contract dispute"),
        description: String::from("Breach of a supply contract"),
        priority: CasePriority::Medium,
        created_at: fixed_time(),
    }
}

pub fn new_staff(user: &str, role: StaffRole) -> Staff {
    Staff::hire(
        GuildId::new(GUILD),
        UserId::new(user),
        role,
        UserId::new("owner"),
        fixed_time(),
    )
}
