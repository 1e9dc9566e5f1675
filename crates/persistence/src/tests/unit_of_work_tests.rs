// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{GUILD, create_test_repositories, new_case};
use anarchy::{RepositoryError, UnitOfWork};
use anarchy_domain::{Case, GuildId};

#[test]
fn test_commit_persists_writes() {
    let (_database, repos) = create_test_repositories();
    let guild: GuildId = GuildId::new(GUILD);

    let case: Case = {
        let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();
        uow.begin().unwrap();
        let sequence: u32 = uow.counters().get_next_case_number(&guild).unwrap();
        let case: Case = uow.cases().add(&new_case(GUILD, sequence, "client-1")).unwrap();
        uow.commit().unwrap();
        assert!(!uow.is_active());
        case
    };

    assert_eq!(repos.cases.find_by_id(case.id).unwrap(), Some(case));
    assert_eq!(repos.counters.get_next_case_number(&guild).unwrap(), 2);
}

#[test]
fn test_explicit_rollback_reverts_case_and_counter() {
    let (_database, repos) = create_test_repositories();
    let guild: GuildId = GuildId::new(GUILD);

    let case: Case = {
        let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();
        uow.begin().unwrap();
        let sequence: u32 = uow.counters().get_next_case_number(&guild).unwrap();
        let case: Case = uow.cases().add(&new_case(GUILD, sequence, "client-1")).unwrap();
        uow.rollback().unwrap();
        case
    };

    assert_eq!(repos.cases.find_by_id(case.id).unwrap(), None);
    assert_eq!(repos.counters.get_next_case_number(&guild).unwrap(), 1);
}

#[test]
fn test_dropping_active_unit_of_work_rolls_back() {
    let (_database, repos) = create_test_repositories();

    {
        let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();
        uow.begin().unwrap();
        uow.cases().add(&new_case(GUILD, 1, "client-1")).unwrap();
    }

    let cases: Vec<Case> = repos
        .cases
        .find_by_client(&anarchy_domain::UserId::new("client-1"))
        .unwrap();
    assert!(cases.is_empty());
}

#[test]
fn test_reads_inside_transaction_see_own_writes() {
    let (_database, repos) = create_test_repositories();
    let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();
    uow.begin().unwrap();

    let case: Case = uow.cases().add(&new_case(GUILD, 1, "client-1")).unwrap();
    let found: Option<Case> = uow.cases().find_by_id(case.id).unwrap();

    assert_eq!(found, Some(case));
    uow.rollback().unwrap();
}

#[test]
fn test_begin_twice_is_a_state_error() {
    let (_database, repos) = create_test_repositories();
    let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();
    uow.begin().unwrap();

    let result: Result<(), RepositoryError> = uow.begin();

    assert!(matches!(result, Err(RepositoryError::TransactionState(_))));
    assert!(uow.is_active());
}

#[test]
fn test_commit_and_rollback_without_begin_are_state_errors() {
    let (_database, repos) = create_test_repositories();
    let mut uow: Box<dyn UnitOfWork + '_> = repos.unit_of_work_factory.create().unwrap();

    assert!(matches!(uow.commit(), Err(RepositoryError::TransactionState(_))));
    assert!(matches!(uow.rollback(), Err(RepositoryError::TransactionState(_))));
}

#[test]
fn test_transaction_ids_are_unique() {
    let (_database, repos) = create_test_repositories();

    let first: String = repos
        .unit_of_work_factory
        .create()
        .unwrap()
        .transaction_id()
        .to_string();
    let second: String = repos
        .unit_of_work_factory
        .create()
        .unwrap()
        .transaction_id()
        .to_string();

    assert!(first.starts_with("txn_"));
    assert_ne!(first, second);
}

#[test]
fn test_create_before_connect_is_not_connected() {
    let database: std::sync::Arc<crate::Database> =
        std::sync::Arc::new(crate::Database::new_in_memory());
    let repos: crate::Repositories = crate::Repositories::new(&database);

    let result = repos.unit_of_work_factory.create();

    assert!(matches!(result, Err(RepositoryError::NotConnected)));
}
