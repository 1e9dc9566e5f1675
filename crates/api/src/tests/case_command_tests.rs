// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anarchy_audit::AuditAction;
use anarchy_domain::StaffRole;

use crate::tests::helpers::{LAWYER_ROLE, LEAD_ROLE, OTHER_GUILD, TestHarness, member};
use crate::{
    AcceptCaseRequest, AddNoteRequest, ApiError, CaseInfo, CaseLawyerRequest, CloseCaseRequest,
    CommandResponse, CreateCaseRequest, DeclineCaseRequest, InvocationContext, ListCasesRequest,
    ReassignLawyerRequest, ReassignmentInfo, UpdatePriorityRequest,
};

fn create_request(title: &str) -> CreateCaseRequest {
    CreateCaseRequest {
        client_username: String::from("Client One"),
        title: title.to_string(),
        description: String::new(),
        priority: None,
    }
}

fn close_request(case_id: i64) -> CloseCaseRequest {
    CloseCaseRequest {
        case_id,
        result: String::from("settlement"),
        notes: Some(String::from("Settled out of court")),
    }
}

#[test]
fn test_create_case_opens_pending_case_with_channel() {
    let harness: TestHarness = TestHarness::new();

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .create_case(&member("client-1", &[]), &create_request("Contract dispute"))
        .unwrap();

    let case: CaseInfo = response.result;
    assert_eq!(case.status, "pending");
    assert_eq!(case.priority, "medium");
    assert_eq!(case.client_id, "client-1");
    assert!(case.case_number.ends_with("-0001-Client-One"));
    assert_eq!(case.channel_id, Some(format!("channel-{}", case.case_id)));
    assert!(response.warnings.is_empty());
    assert_eq!(
        harness.discord.calls(),
        vec![format!("create:{}", case.case_number)]
    );
    assert_eq!(harness.audit_actions(), vec![AuditAction::CaseCreated]);
}

#[test]
fn test_create_case_with_blank_title_is_invalid_input() {
    let harness: TestHarness = TestHarness::new();

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness
        .handlers
        .create_case(&member("client-1", &[]), &create_request("   "));

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "title"
    ));
    assert!(harness.discord.calls().is_empty());
}

#[test]
fn test_create_case_with_unknown_priority_is_invalid_input() {
    let harness: TestHarness = TestHarness::new();
    let mut request: CreateCaseRequest = create_request("Contract dispute");
    request.priority = Some(String::from("whenever"));

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness
        .handlers
        .create_case(&member("client-1", &[]), &request);

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "priority"
    ));
}

#[test]
fn test_create_case_warns_when_approaching_limit() {
    let harness: TestHarness = TestHarness::new();
    for _ in 0..3 {
        harness.open_case("client-1");
    }

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .create_case(&member("client-1", &[]), &create_request("Fourth matter"))
        .unwrap();

    assert_eq!(
        response.warnings,
        vec![String::from(
            "Client has 3 active cases (approaching limit of 5)"
        )]
    );
}

#[test]
fn test_create_case_at_limit_is_denied_even_for_owner() {
    let harness: TestHarness = TestHarness::new();
    let mut client: InvocationContext = member("client-1", &[]);
    client.is_guild_owner = true;
    for _ in 0..5 {
        harness.handlers.create_case(&client, &create_request("Matter")).unwrap();
    }

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness
        .handlers
        .create_case(&client, &create_request("One too many"));

    assert_eq!(
        result,
        Err(ApiError::ValidationFailed {
            errors: vec![String::from(
                "Client has reached the maximum limit of 5 active cases"
            )],
        })
    );
    assert_eq!(harness.handlers.bypasses().pending_count(), 0);
}

#[test]
fn test_accept_case_makes_lawyer_lead() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_case("client-1");

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .accept_case(
            &member("lawyer-1", &[LAWYER_ROLE]),
            &AcceptCaseRequest {
                case_id: case.case_id,
            },
        )
        .unwrap();

    assert_eq!(response.result.status, "in-progress");
    assert_eq!(response.result.lead_attorney_id.as_deref(), Some("lawyer-1"));
    assert_eq!(response.result.assigned_lawyer_ids, vec![String::from("lawyer-1")]);
}

#[test]
fn test_accept_case_twice_reports_current_status() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    harness.seed_staff("lawyer-2", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.accept_case(
        &member("lawyer-2", &[LAWYER_ROLE]),
        &AcceptCaseRequest {
            case_id: case.case_id,
        },
    );

    assert_eq!(
        result,
        Err(ApiError::DomainRuleViolation {
            rule: String::from("case_status"),
            message: String::from("Case cannot be accepted - current status: in-progress"),
        })
    );
}

#[test]
fn test_accept_case_by_non_staff_is_denied() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.accept_case(
        &member("outsider", &[LAWYER_ROLE]),
        &AcceptCaseRequest {
            case_id: case.case_id,
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::ValidationFailed { ref errors })
            if errors.contains(&String::from("User is not an active staff member"))
    ));
}

#[test]
fn test_case_from_another_guild_is_not_found() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_case("client-1");
    let mut elsewhere: InvocationContext = member("lawyer-1", &[LAWYER_ROLE]);
    elsewhere.guild_id = String::from(OTHER_GUILD);

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.accept_case(
        &elsewhere,
        &AcceptCaseRequest {
            case_id: case.case_id,
        },
    );

    assert_eq!(
        result,
        Err(ApiError::ResourceNotFound {
            resource_type: String::from("Case"),
            message: String::from("Case not found"),
        })
    );
}

#[test]
fn test_decline_pending_case() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .decline_case(
            &member("lawyer-1", &[LAWYER_ROLE]),
            &DeclineCaseRequest {
                case_id: case.case_id,
                reason: Some(String::from("Outside our practice area")),
            },
        )
        .unwrap();

    assert_eq!(response.result.status, "closed");
}

#[test]
fn test_close_case_archives_channel() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .close_case(&member("lawyer-1", &[LEAD_ROLE]), &close_request(case.case_id))
        .unwrap();

    assert_eq!(response.result.status, "closed");
    assert_eq!(response.result.result.as_deref(), Some("settlement"));
    assert_eq!(
        response.result.result_notes.as_deref(),
        Some("Settled out of court")
    );
    assert!(
        harness
            .discord
            .calls()
            .contains(&format!("archive:channel-{}", case.case_id))
    );
    assert_eq!(
        harness.audit_actions().last(),
        Some(&AuditAction::CaseClosed)
    );
}

#[test]
fn test_close_case_with_active_reminder_is_denied() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");
    harness.add_reminder(case.case_id);

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness
        .handlers
        .close_case(&member("lawyer-1", &[LEAD_ROLE]), &close_request(case.case_id));

    assert_eq!(
        result,
        Err(ApiError::ValidationFailed {
            errors: vec![String::from(
                "Case has 1 unresolved reminder(s) - resolve them before closing"
            )],
        })
    );
}

#[test]
fn test_close_pending_case_reports_current_status() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness
        .handlers
        .close_case(&member("lawyer-1", &[LEAD_ROLE]), &close_request(case.case_id));

    assert_eq!(
        result,
        Err(ApiError::DomainRuleViolation {
            rule: String::from("case_status"),
            message: String::from("Case cannot be closed - current status: pending"),
        })
    );
}

#[test]
fn test_assign_lawyer_grants_channel_access() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    harness.seed_staff("lawyer-2", StaffRole::JuniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .assign_lawyer(
            &member("lawyer-1", &[LEAD_ROLE]),
            &CaseLawyerRequest {
                case_id: case.case_id,
                lawyer_id: String::from("lawyer-2"),
            },
        )
        .unwrap();

    assert_eq!(
        response.result.assigned_lawyer_ids,
        vec![String::from("lawyer-1"), String::from("lawyer-2")]
    );
    assert!(
        harness
            .discord
            .calls()
            .contains(&format!("grant:channel-{}:lawyer-2", case.case_id))
    );
}

#[test]
fn test_assign_paralegal_is_denied() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    harness.seed_staff("para-1", StaffRole::Paralegal);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.assign_lawyer(
        &member("lawyer-1", &[LEAD_ROLE]),
        &CaseLawyerRequest {
            case_id: case.case_id,
            lawyer_id: String::from("para-1"),
        },
    );

    assert_eq!(
        result,
        Err(ApiError::ValidationFailed {
            errors: vec![String::from("A Paralegal cannot be assigned to cases")],
        })
    );
}

#[test]
fn test_unassign_and_set_lead_attorney() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    harness.seed_staff("lawyer-2", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");
    let lead: InvocationContext = member("lawyer-1", &[LEAD_ROLE]);
    let request: CaseLawyerRequest = CaseLawyerRequest {
        case_id: case.case_id,
        lawyer_id: String::from("lawyer-2"),
    };
    harness.handlers.assign_lawyer(&lead, &request).unwrap();

    let promoted: CommandResponse<CaseInfo> =
        harness.handlers.set_lead_attorney(&lead, &request).unwrap();
    assert_eq!(promoted.result.lead_attorney_id.as_deref(), Some("lawyer-2"));

    let removed: CommandResponse<CaseInfo> = harness
        .handlers
        .unassign_lawyer(
            &lead,
            &CaseLawyerRequest {
                case_id: case.case_id,
                lawyer_id: String::from("lawyer-1"),
            },
        )
        .unwrap();
    assert_eq!(removed.result.assigned_lawyer_ids, vec![String::from("lawyer-2")]);
    assert_eq!(removed.result.lead_attorney_id.as_deref(), Some("lawyer-2"));
    assert_eq!(
        harness.discord.calls().last(),
        Some(&format!("revoke:channel-{}:lawyer-1", case.case_id))
    );
}

#[test]
fn test_set_lead_attorney_requires_assignment() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.set_lead_attorney(
        &member("lawyer-1", &[LEAD_ROLE]),
        &CaseLawyerRequest {
            case_id: case.case_id,
            lawyer_id: String::from("lawyer-9"),
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "lead_attorney_assigned"
    ));
}

#[test]
fn test_reassign_lawyer_moves_between_cases() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    harness.seed_staff("lawyer-2", StaffRole::SeniorAssociate);
    harness.seed_staff("lawyer-3", StaffRole::JuniorAssociate);
    let first: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");
    let second: CaseInfo = harness.open_accepted_case("client-2", "lawyer-2");
    let lead: InvocationContext = member("lawyer-1", &[LEAD_ROLE]);
    harness
        .handlers
        .assign_lawyer(
            &lead,
            &CaseLawyerRequest {
                case_id: first.case_id,
                lawyer_id: String::from("lawyer-3"),
            },
        )
        .unwrap();

    let response: CommandResponse<ReassignmentInfo> = harness
        .handlers
        .reassign_lawyer(
            &lead,
            &ReassignLawyerRequest {
                from_case_id: first.case_id,
                to_case_id: second.case_id,
                lawyer_id: String::from("lawyer-3"),
            },
        )
        .unwrap();

    assert_eq!(
        response.result.from_case.assigned_lawyer_ids,
        vec![String::from("lawyer-1")]
    );
    assert_eq!(
        response.result.to_case.assigned_lawyer_ids,
        vec![String::from("lawyer-2"), String::from("lawyer-3")]
    );
    let calls: Vec<String> = harness.discord.calls();
    assert_eq!(
        calls[calls.len() - 2..],
        [
            format!("revoke:channel-{}:lawyer-3", first.case_id),
            format!("grant:channel-{}:lawyer-3", second.case_id),
        ]
    );
}

#[test]
fn test_closed_case_rejects_notes() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let case: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");
    let lead: InvocationContext = member("lawyer-1", &[LEAD_ROLE]);
    harness
        .handlers
        .close_case(&lead, &close_request(case.case_id))
        .unwrap();

    let result: Result<CommandResponse<CaseInfo>, ApiError> = harness.handlers.add_note(
        &lead,
        &AddNoteRequest {
            case_id: case.case_id,
            content: String::from("Late thought"),
            is_internal: false,
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "case_open"
    ));
}

#[test]
fn test_update_priority() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");

    let response: CommandResponse<CaseInfo> = harness
        .handlers
        .update_priority(
            &member("lawyer-1", &[LAWYER_ROLE]),
            &UpdatePriorityRequest {
                case_id: case.case_id,
                priority: String::from("urgent"),
            },
        )
        .unwrap();

    assert_eq!(response.result.priority, "urgent");
}

#[test]
fn test_client_sees_case_without_internal_notes() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");
    let lawyer: InvocationContext = member("lawyer-1", &[LAWYER_ROLE]);
    for (content, is_internal) in [("Client update", false), ("Weak witness", true)] {
        harness
            .handlers
            .add_note(
                &lawyer,
                &AddNoteRequest {
                    case_id: case.case_id,
                    content: content.to_string(),
                    is_internal,
                },
            )
            .unwrap();
    }

    let as_client: CaseInfo = harness
        .handlers
        .get_case(&member("client-1", &[]), case.case_id)
        .unwrap();
    let as_staff: CaseInfo = harness
        .handlers
        .get_case(&member("lead-1", &[LEAD_ROLE]), case.case_id)
        .unwrap();

    let client_notes: Vec<&str> = as_client
        .notes
        .iter()
        .map(|note| note.content.as_str())
        .collect();
    assert_eq!(client_notes, vec!["Client update"]);
    assert_eq!(as_staff.notes.len(), 2);
}

#[test]
fn test_get_case_by_stranger_is_unauthorized() {
    let harness: TestHarness = TestHarness::new();
    let case: CaseInfo = harness.open_case("client-1");

    let result: Result<CaseInfo, ApiError> = harness
        .handlers
        .get_case(&member("client-2", &[]), case.case_id);

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_list_cases_requires_case_permission() {
    let harness: TestHarness = TestHarness::new();
    harness.open_case("client-1");
    let request: ListCasesRequest = ListCasesRequest {
        status: String::from("pending"),
    };

    let denied: Result<CommandResponse<Vec<CaseInfo>>, ApiError> = harness
        .handlers
        .list_cases(&member("client-1", &[]), &request);
    let listed: CommandResponse<Vec<CaseInfo>> = harness
        .handlers
        .list_cases(&member("lead-1", &[LEAD_ROLE]), &request)
        .unwrap();

    assert_eq!(
        denied,
        Err(ApiError::ValidationFailed {
            errors: vec![String::from("Missing required permission: case")],
        })
    );
    assert_eq!(listed.result.len(), 1);
    assert_eq!(listed.message, "1 pending case(s)");
}

#[test]
fn test_my_cases_lists_open_assignments() {
    let harness: TestHarness = TestHarness::new();
    harness.seed_staff("lawyer-1", StaffRole::SeniorAssociate);
    let open: CaseInfo = harness.open_accepted_case("client-1", "lawyer-1");
    let closed: CaseInfo = harness.open_accepted_case("client-2", "lawyer-1");
    harness
        .handlers
        .close_case(&member("lawyer-1", &[LEAD_ROLE]), &close_request(closed.case_id))
        .unwrap();

    let cases: Vec<CaseInfo> = harness
        .handlers
        .my_cases(&member("lawyer-1", &[LAWYER_ROLE]))
        .unwrap();

    let ids: Vec<i64> = cases.iter().map(|case| case.case_id).collect();
    assert_eq!(ids, vec![open.case_id]);
}
