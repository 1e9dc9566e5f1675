// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

use crate::{
    Case, CaseId, CaseNumber, CasePriority, CaseStatus, CaseTransition, DomainError, GuildId,
    UserId, sanitize_client_username,
};

fn create_test_case() -> Case {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    Case {
        id: CaseId::new(1),
        guild_id: GuildId::new("guild-1"),
        case_number: CaseNumber::generate(2026, 1, "client"),
        client_id: UserId::new("client-1"),
        client_username: String::from("client"),
        title: String::from("Contract dispute"),
        description: String::from("Breach of contract"),
        status: CaseStatus::Pending,
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
    }
}

#[test]
fn test_case_number_zero_pads_sequence() {
    let number: CaseNumber = CaseNumber::generate(2026, 42, "test_client-123");
    assert_eq!(number.as_str(), "2026-0042-test_client-123");
}

#[test]
fn test_case_number_keeps_wide_sequences() {
    let number: CaseNumber = CaseNumber::generate(2026, 12345, "a");
    assert_eq!(number.as_str(), "2026-12345-a");
}

#[test]
fn test_sanitize_replaces_disallowed_characters() {
    assert_eq!(sanitize_client_username("john.doe#1"), "john-doe-1");
    assert_eq!(sanitize_client_username("ünï"), "-n-");
    assert_eq!(sanitize_client_username("plain_name-1"), "plain_name-1");
}

#[test]
fn test_status_parses_both_spellings_of_in_progress() {
    assert_eq!("in-progress".parse::<CaseStatus>(), Ok(CaseStatus::InProgress));
    assert_eq!("in_progress".parse::<CaseStatus>(), Ok(CaseStatus::InProgress));
    assert!("open".parse::<CaseStatus>().is_err());
}

#[test]
fn test_status_transitions_follow_lifecycle() {
    assert!(CaseStatus::Pending.can_transition_to(CaseStatus::InProgress));
    assert!(CaseStatus::InProgress.can_transition_to(CaseStatus::Closed));
    assert!(CaseStatus::Pending.can_transition_to(CaseStatus::Closed));
    assert!(!CaseStatus::InProgress.can_transition_to(CaseStatus::Pending));
    assert!(!CaseStatus::Closed.can_transition_to(CaseStatus::InProgress));
    assert!(!CaseStatus::Closed.can_transition_to(CaseStatus::Pending));
}

#[test]
fn test_transitions_require_exact_source_status() {
    assert!(CaseTransition::Accept.permits(CaseStatus::Pending));
    assert!(!CaseTransition::Accept.permits(CaseStatus::InProgress));
    assert!(CaseTransition::Close.permits(CaseStatus::InProgress));
    assert!(!CaseTransition::Close.permits(CaseStatus::Pending));
    assert!(!CaseTransition::Close.permits(CaseStatus::Closed));
    assert!(CaseTransition::Decline.permits(CaseStatus::Pending));
    assert!(CaseTransition::Decline.permits(CaseStatus::InProgress));
    assert!(!CaseTransition::Decline.permits(CaseStatus::Closed));
}

#[test]
fn test_assign_lawyer_is_idempotent_and_sets_first_lead() {
    let mut case: Case = create_test_case();
    let lawyer: UserId = UserId::new("lawyer-1");

    assert!(case.assign_lawyer(&lawyer));
    assert!(!case.assign_lawyer(&lawyer));

    assert_eq!(case.assigned_lawyer_ids, vec![lawyer.clone()]);
    assert_eq!(case.lead_attorney_id, Some(lawyer));
}

#[test]
fn test_unassign_lead_promotes_next_in_order() {
    let mut case: Case = create_test_case();
    let first: UserId = UserId::new("lawyer-1");
    let second: UserId = UserId::new("lawyer-2");
    let third: UserId = UserId::new("lawyer-3");
    case.assign_lawyer(&first);
    case.assign_lawyer(&second);
    case.assign_lawyer(&third);

    assert!(case.unassign_lawyer(&first));

    assert_eq!(case.lead_attorney_id, Some(second));
    assert!(case.validate_invariants().is_ok());
}

#[test]
fn test_unassign_last_lawyer_clears_lead() {
    let mut case: Case = create_test_case();
    let lawyer: UserId = UserId::new("lawyer-1");
    case.assign_lawyer(&lawyer);

    assert!(case.unassign_lawyer(&lawyer));

    assert!(case.assigned_lawyer_ids.is_empty());
    assert_eq!(case.lead_attorney_id, None);
}

#[test]
fn test_unassign_non_lead_keeps_lead() {
    let mut case: Case = create_test_case();
    let lead: UserId = UserId::new("lawyer-1");
    let other: UserId = UserId::new("lawyer-2");
    case.assign_lawyer(&lead);
    case.assign_lawyer(&other);

    assert!(case.unassign_lawyer(&other));
    assert!(!case.unassign_lawyer(&other));

    assert_eq!(case.lead_attorney_id, Some(lead));
}

#[test]
fn test_set_lead_attorney_requires_assignment() {
    let mut case: Case = create_test_case();
    let outsider: UserId = UserId::new("outsider");

    let result = case.set_lead_attorney(&outsider);

    assert_eq!(result, Err(DomainError::LeadAttorneyNotAssigned(outsider)));
}

#[test]
fn test_validate_invariants_detects_orphan_lead() {
    let mut case: Case = create_test_case();
    case.lead_attorney_id = Some(UserId::new("ghost"));

    assert!(case.validate_invariants().is_err());
}

#[test]
fn test_ensure_open_rejects_closed_case() {
    let mut case: Case = create_test_case();
    case.status = CaseStatus::Closed;

    assert!(matches!(case.ensure_open(), Err(DomainError::CaseClosed(_))));
}
