// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{GUILD, create_test_repositories, fixed_time, new_staff};
use anarchy::RepositoryError;
use anarchy_domain::{GuildId, Staff, StaffRole, StaffStatus, UserId};

#[test]
fn test_add_and_find_staff() {
    let (_database, repos) = create_test_repositories();
    let member: Staff = new_staff("user-1", StaffRole::JuniorAssociate);

    let stored: Staff = repos.staff.add(&member).unwrap();
    let found: Option<Staff> = repos
        .staff
        .find_by_user_id(&GuildId::new(GUILD), &UserId::new("user-1"))
        .unwrap();

    assert_eq!(stored, member);
    assert_eq!(found, Some(member));
}

#[test]
fn test_find_is_guild_scoped() {
    let (_database, repos) = create_test_repositories();
    repos.staff.add(&new_staff("user-1", StaffRole::Paralegal)).unwrap();

    let found: Option<Staff> = repos
        .staff
        .find_by_user_id(&GuildId::new("other-guild"), &UserId::new("user-1"))
        .unwrap();

    assert_eq!(found, None);
}

#[test]
fn test_duplicate_staff_is_conflict() {
    let (_database, repos) = create_test_repositories();
    repos.staff.add(&new_staff("user-1", StaffRole::Paralegal)).unwrap();

    let result = repos.staff.add(&new_staff("user-1", StaffRole::SeniorAssociate));

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[test]
fn test_count_by_role_ignores_terminated_staff() {
    let (_database, repos) = create_test_repositories();
    repos.staff.add(&new_staff("user-1", StaffRole::Paralegal)).unwrap();
    repos.staff.add(&new_staff("user-2", StaffRole::Paralegal)).unwrap();
    repos.staff.add(&new_staff("user-3", StaffRole::Paralegal)).unwrap();
    let mut fired: Staff = new_staff("user-2", StaffRole::Paralegal);
    fired.status = StaffStatus::Terminated;
    fired.terminated_by = Some(UserId::new("owner"));
    fired.terminated_at = Some(fixed_time());
    repos.staff.update(&fired).unwrap();

    let count: u32 = repos
        .staff
        .get_staff_count_by_role(&GuildId::new(GUILD), StaffRole::Paralegal)
        .unwrap();
    let paralegals: Vec<Staff> = repos
        .staff
        .find_by_role(&GuildId::new(GUILD), StaffRole::Paralegal)
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(paralegals.len(), 2);
    assert!(paralegals.iter().all(Staff::is_active));
}

#[test]
fn test_update_persists_termination_and_rehire() {
    let (_database, repos) = create_test_repositories();
    repos.staff.add(&new_staff("user-1", StaffRole::Paralegal)).unwrap();
    let mut member: Staff = new_staff("user-1", StaffRole::Paralegal);
    member.status = StaffStatus::Terminated;
    member.terminated_by = Some(UserId::new("owner"));
    member.terminated_at = Some(fixed_time());

    let terminated: Option<Staff> = repos.staff.update(&member).unwrap();
    assert_eq!(terminated.as_ref().map(|m| m.status), Some(StaffStatus::Terminated));
    assert_eq!(
        terminated.and_then(|m| m.terminated_at),
        Some(fixed_time())
    );

    let rehired: Staff = new_staff("user-1", StaffRole::SeniorAssociate);
    let stored: Option<Staff> = repos.staff.update(&rehired).unwrap();

    assert_eq!(stored, Some(rehired));
}

#[test]
fn test_update_missing_staff_returns_none() {
    let (_database, repos) = create_test_repositories();

    let result: Option<Staff> = repos
        .staff
        .update(&new_staff("ghost", StaffRole::Paralegal))
        .unwrap();

    assert_eq!(result, None);
}

#[test]
fn test_find_active_staff_lists_every_active_role() {
    let (_database, repos) = create_test_repositories();
    repos.staff.add(&new_staff("user-1", StaffRole::ManagingPartner)).unwrap();
    repos.staff.add(&new_staff("user-2", StaffRole::Paralegal)).unwrap();
    let mut gone: Staff = new_staff("user-3", StaffRole::Paralegal);
    gone.status = StaffStatus::Terminated;
    repos.staff.add(&gone).unwrap();

    let active: Vec<Staff> = repos.staff.find_active_staff(&GuildId::new(GUILD)).unwrap();
    let mut ids: Vec<&str> = active.iter().map(|m| m.user_id.as_str()).collect();
    ids.sort_unstable();

    assert_eq!(ids, vec!["user-1", "user-2"]);
}
