// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{FakeStore, GUILD};
use crate::{CoreError, StaffService};
use anarchy_audit::AuditAction;
use anarchy_domain::{DomainError, GuildId, Staff, StaffRole, StaffStatus, UserId};
use std::sync::Arc;

fn create_service(store: &Arc<FakeStore>) -> StaffService {
    StaffService::new(store.clone(), store.clone())
}

fn guild() -> GuildId {
    GuildId::new(GUILD)
}

#[test]
fn test_hire_creates_active_staff_and_audits() {
    let store: Arc<FakeStore> = FakeStore::new();
    let service: StaffService = create_service(&store);

    let staff: Staff = service
        .hire_staff(&guild(), &UserId::new("new"), StaffRole::Paralegal, &UserId::new("hr"))
        .unwrap();

    assert!(staff.is_active());
    assert_eq!(staff.hired_by, UserId::new("hr"));
    assert_eq!(store.audit_actions(), vec![AuditAction::StaffHired]);
}

#[test]
fn test_hire_rejects_active_member() {
    let store: Arc<FakeStore> = FakeStore::new();
    store.seed_staff("existing", StaffRole::Paralegal);
    let service: StaffService = create_service(&store);

    let result = service.hire_staff(
        &guild(),
        &UserId::new("existing"),
        StaffRole::Paralegal,
        &UserId::new("hr"),
    );

    assert_eq!(result, Err(CoreError::StaffAlreadyActive));
    assert_eq!(store.call_count("staff.add"), 0);
}

#[test]
fn test_rehire_reactivates_terminated_record() {
    let store: Arc<FakeStore> = FakeStore::new();
    store.seed_staff("former", StaffRole::JuniorPartner);
    let service: StaffService = create_service(&store);
    service
        .fire_staff(&guild(), &UserId::new("former"), &UserId::new("hr"), Some("misconduct"))
        .unwrap();

    let rehired: Staff = service
        .hire_staff(&guild(), &UserId::new("former"), StaffRole::Paralegal, &UserId::new("hr"))
        .unwrap();

    assert_eq!(rehired.status, StaffStatus::Active);
    assert_eq!(rehired.role, StaffRole::Paralegal);
    assert_eq!(rehired.terminated_by, None);
    assert_eq!(store.call_count("staff.add"), 0);
    assert_eq!(store.state.lock().unwrap().staff.len(), 1);
}

#[test]
fn test_fire_is_soft_delete() {
    let store: Arc<FakeStore> = FakeStore::new();
    store.seed_staff("leaving", StaffRole::SeniorAssociate);
    let service: StaffService = create_service(&store);

    let fired: Staff = service
        .fire_staff(&guild(), &UserId::new("leaving"), &UserId::new("hr"), None)
        .unwrap();

    assert_eq!(fired.status, StaffStatus::Terminated);
    assert_eq!(fired.terminated_by, Some(UserId::new("hr")));
    assert!(fired.terminated_at.is_some());
    assert!(service.list_staff(&guild()).unwrap().is_empty());
    assert!(service.get_staff(&guild(), &UserId::new("leaving")).unwrap().is_some());
}

#[test]
fn test_fire_unknown_member() {
    let store: Arc<FakeStore> = FakeStore::new();
    let service: StaffService = create_service(&store);

    let result = service.fire_staff(&guild(), &UserId::new("ghost"), &UserId::new("hr"), None);

    assert_eq!(result, Err(CoreError::StaffNotFound));
}

#[test]
fn test_promote_and_demote_change_role_only() {
    let store: Arc<FakeStore> = FakeStore::new();
    let seeded: Staff = store.seed_staff("climber", StaffRole::JuniorAssociate);
    let service: StaffService = create_service(&store);

    let promoted: Staff = service
        .promote_staff(&guild(), &UserId::new("climber"), StaffRole::JuniorPartner, &UserId::new("mp"))
        .unwrap();
    assert_eq!(promoted.role, StaffRole::JuniorPartner);
    assert_eq!(promoted.hired_at, seeded.hired_at);

    let demoted: Staff = service
        .demote_staff(&guild(), &UserId::new("climber"), StaffRole::SeniorAssociate, &UserId::new("mp"))
        .unwrap();
    assert_eq!(demoted.role, StaffRole::SeniorAssociate);
    assert_eq!(
        store.audit_actions(),
        vec![AuditAction::StaffPromoted, AuditAction::StaffDemoted]
    );
}

#[test]
fn test_promotion_must_go_up() {
    let store: Arc<FakeStore> = FakeStore::new();
    store.seed_staff("partner", StaffRole::SeniorPartner);
    let service: StaffService = create_service(&store);

    let result = service.promote_staff(
        &guild(),
        &UserId::new("partner"),
        StaffRole::Paralegal,
        &UserId::new("mp"),
    );

    assert_eq!(
        result,
        Err(CoreError::Domain(DomainError::InvalidRoleChange {
            from: String::from("Senior Partner"),
            to: String::from("Paralegal"),
            direction: "promotion",
        }))
    );
    assert_eq!(store.call_count("staff.update"), 0);
}

#[test]
fn test_audit_failure_does_not_abort_hire() {
    let store: Arc<FakeStore> = FakeStore::new();
    store.fail_on("audit.log");
    let service: StaffService = create_service(&store);

    let result = service.hire_staff(
        &guild(),
        &UserId::new("new"),
        StaffRole::Paralegal,
        &UserId::new("hr"),
    );

    assert!(result.is_ok());
    assert_eq!(store.call_count("audit.log"), 1);
}
