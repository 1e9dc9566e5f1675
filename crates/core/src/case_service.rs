// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Case creation, lifecycle transitions and lawyer assignment.
//!
//! Status transitions are written with a conditional update keyed on the
//! status the transition starts from, so that two racing callers can never
//! both succeed. Edits leave status alone and are guarded by the status they
//! read, so an edit that loses to a transition is redone on a fresh read.

use crate::audit_trail;
use crate::error::CoreError;
use crate::repository::{
    RepositoryError, SharedAuditSink, SharedCaseCounterRepository, SharedCaseRepository,
};
use anarchy_audit::{AuditAction, AuditDetails, AuditLogEntry};
use anarchy_domain::{
    Case, CaseDocument, CaseId, CaseNote, CaseNumber, CasePriority, CaseResult, CaseStatus,
    CaseTransition, GuildId, NewCase, UserId, validate_case_title,
};
use time::OffsetDateTime;
use tracing::{debug, info};

/// Reads one edit may take. Status moves forward at most twice, so the
/// last read always sees it settled.
const EDIT_ATTEMPTS: usize = 3;

/// Outcome of an edit to an open case.
enum CaseEdit {
    /// The edit was a no-op and nothing was written.
    Unchanged(Case),
    Written { previous: Case, updated: Case },
}

/// What a client supplies when opening a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRequest {
    pub guild_id: GuildId,
    pub client_id: UserId,
    pub client_username: String,
    pub title: String,
    pub description: String,
    pub priority: CasePriority,
}

impl CaseRequest {
    /// Reserves `sequence` as this request's case number and builds the insert.
    pub(crate) fn into_new_case(self, sequence: u32, now: OffsetDateTime) -> NewCase {
        let case_number: CaseNumber =
            CaseNumber::generate(now.year(), sequence, &self.client_username);
        NewCase {
            guild_id: self.guild_id,
            case_number,
            client_id: self.client_id,
            client_username: self.client_username,
            title: self.title,
            description: self.description,
            priority: self.priority,
            created_at: now,
        }
    }
}

pub struct CaseService {
    cases: SharedCaseRepository,
    counters: SharedCaseCounterRepository,
    audit: SharedAuditSink,
}

impl CaseService {
    #[must_use]
    pub fn new(
        cases: SharedCaseRepository,
        counters: SharedCaseCounterRepository,
        audit: SharedAuditSink,
    ) -> Self {
        Self {
            cases,
            counters,
            audit,
        }
    }

    /// Opens a pending case with a freshly reserved case number.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is invalid, the counter cannot be
    /// incremented, or the insert fails. Nothing is inserted when the
    /// counter fails.
    pub fn create_case(&self, request: CaseRequest) -> Result<Case, CoreError> {
        validate_case_title(&request.title)?;
        let sequence: u32 = self.counters.get_next_case_number(&request.guild_id)?;
        let new_case: NewCase = request.into_new_case(sequence, OffsetDateTime::now_utc());
        let case: Case = self.cases.add(&new_case)?;

        info!(
            guild_id = %case.guild_id,
            case_id = %case.id,
            case_number = %case.case_number,
            "Created case"
        );
        self.record(
            &case,
            AuditAction::CaseCreated,
            &case.client_id,
            AuditDetails::new().with_metadata("case_number", &case.case_number),
        );
        Ok(case)
    }

    /// Moves a pending case to in-progress with `lawyer_id` as lead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCaseStatus` if the case is not pending, including when
    /// another caller accepted it first.
    pub fn accept_case(&self, case_id: CaseId, lawyer_id: &UserId) -> Result<Case, CoreError> {
        let transition: CaseTransition = CaseTransition::Accept;
        let mut case: Case = self.load_for_transition(case_id, transition)?;
        let previous: CaseStatus = case.status;

        case.status = transition.target();
        case.assign_lawyer(lawyer_id);
        case.set_lead_attorney(lawyer_id)?;
        case.updated_at = OffsetDateTime::now_utc();

        let accepted: Case = self.write_transition(&case, previous, transition)?;
        info!(
            guild_id = %accepted.guild_id,
            case_id = %accepted.id,
            lawyer_id = %lawyer_id,
            "Accepted case"
        );
        self.record(
            &accepted,
            AuditAction::CaseAccepted,
            lawyer_id,
            AuditDetails::transition(previous.as_str(), accepted.status.as_str()),
        );
        Ok(accepted)
    }

    /// Closes an in-progress case with a result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCaseStatus` if the case is not in progress. No write
    /// is attempted in that case.
    pub fn close_case(
        &self,
        case_id: CaseId,
        closed_by: &UserId,
        result: CaseResult,
        result_notes: Option<String>,
    ) -> Result<Case, CoreError> {
        let transition: CaseTransition = CaseTransition::Close;
        let case: Case = self.load_for_transition(case_id, transition)?;
        let previous: CaseStatus = case.status;

        let closed: Case = self.write_transition(
            &close_with(case, closed_by, result, result_notes),
            previous,
            transition,
        )?;
        info!(
            guild_id = %closed.guild_id,
            case_id = %closed.id,
            result = %result,
            "Closed case"
        );
        self.record(
            &closed,
            AuditAction::CaseClosed,
            closed_by,
            AuditDetails::transition(previous.as_str(), closed.status.as_str())
                .with_metadata("result", result),
        );
        Ok(closed)
    }

    /// Dismisses a pending or in-progress case.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCaseStatus` if the case is already closed.
    pub fn decline_case(
        &self,
        case_id: CaseId,
        declined_by: &UserId,
        reason: Option<String>,
    ) -> Result<Case, CoreError> {
        let transition: CaseTransition = CaseTransition::Decline;
        let case: Case = self.load_for_transition(case_id, transition)?;
        let previous: CaseStatus = case.status;

        let declined: Case = self.write_transition(
            &close_with(case, declined_by, CaseResult::Dismissed, reason.clone()),
            previous,
            transition,
        )?;
        info!(guild_id = %declined.guild_id, case_id = %declined.id, "Declined case");
        let mut details: AuditDetails =
            AuditDetails::transition(previous.as_str(), declined.status.as_str());
        if let Some(reason) = reason {
            details = details.with_reason(reason);
        }
        self.record(&declined, AuditAction::CaseDeclined, declined_by, details);
        Ok(declined)
    }

    /// Adds a lawyer to a case. Assigning an already-assigned lawyer
    /// returns the case unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the case is missing or closed.
    pub fn assign_lawyer(
        &self,
        case_id: CaseId,
        lawyer_id: &UserId,
        assigned_by: &UserId,
    ) -> Result<Case, CoreError> {
        let updated: Case = match self.edit_open_case(case_id, |case| {
            Ok(case.assign_lawyer(lawyer_id))
        })? {
            CaseEdit::Unchanged(case) => {
                debug!(case_id = %case_id, lawyer_id = %lawyer_id, "Lawyer already assigned");
                return Ok(case);
            }
            CaseEdit::Written { updated, .. } => updated,
        };

        info!(
            guild_id = %updated.guild_id,
            case_id = %updated.id,
            lawyer_id = %lawyer_id,
            "Assigned lawyer"
        );
        self.record(
            &updated,
            AuditAction::LawyerAssigned,
            assigned_by,
            AuditDetails::new().with_metadata("lawyer_id", lawyer_id),
        );
        Ok(updated)
    }

    /// Removes a lawyer, promoting the next assigned lawyer if the lead leaves.
    ///
    /// Unassigning a lawyer who is not on the case returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the case is missing or closed.
    pub fn unassign_lawyer(
        &self,
        case_id: CaseId,
        lawyer_id: &UserId,
        unassigned_by: &UserId,
    ) -> Result<Case, CoreError> {
        let (previous, updated): (Case, Case) = match self.edit_open_case(case_id, |case| {
            Ok(case.unassign_lawyer(lawyer_id))
        })? {
            CaseEdit::Unchanged(case) => return Ok(case),
            CaseEdit::Written { previous, updated } => (previous, updated),
        };

        info!(
            guild_id = %updated.guild_id,
            case_id = %updated.id,
            lawyer_id = %lawyer_id,
            "Unassigned lawyer"
        );
        let mut details: AuditDetails = AuditDetails::new().with_metadata("lawyer_id", lawyer_id);
        if previous.lead_attorney_id != updated.lead_attorney_id {
            details = details.with_metadata(
                "new_lead_attorney_id",
                updated
                    .lead_attorney_id
                    .as_ref()
                    .map_or("none", UserId::as_str),
            );
        }
        self.record(&updated, AuditAction::LawyerUnassigned, unassigned_by, details);
        Ok(updated)
    }

    /// Moves a lawyer from one case to another.
    ///
    /// Moving a lawyer onto the case they are already on changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if either case is missing or closed.
    pub fn reassign_lawyer(
        &self,
        from_case_id: CaseId,
        to_case_id: CaseId,
        lawyer_id: &UserId,
        reassigned_by: &UserId,
    ) -> Result<(Case, Case), CoreError> {
        if from_case_id == to_case_id {
            let case: Case = self.load(from_case_id)?;
            return Ok((case.clone(), case));
        }
        let target: Case = self.load(to_case_id)?;
        target.ensure_open()?;

        let from: Case = self.unassign_lawyer(from_case_id, lawyer_id, reassigned_by)?;
        let to: Case = self.assign_lawyer(to_case_id, lawyer_id, reassigned_by)?;
        Ok((from, to))
    }

    /// Makes an assigned lawyer the lead attorney.
    ///
    /// # Errors
    ///
    /// Returns an error if the case is missing or closed, or the lawyer is
    /// not assigned.
    pub fn set_lead_attorney(
        &self,
        case_id: CaseId,
        lawyer_id: &UserId,
        changed_by: &UserId,
    ) -> Result<Case, CoreError> {
        let (previous, updated): (Case, Case) = match self.edit_open_case(case_id, |case| {
            let unchanged: bool = case.lead_attorney_id.as_ref() == Some(lawyer_id);
            case.set_lead_attorney(lawyer_id)?;
            Ok(!unchanged)
        })? {
            CaseEdit::Unchanged(case) => return Ok(case),
            CaseEdit::Written { previous, updated } => (previous, updated),
        };
        self.record(
            &updated,
            AuditAction::LeadAttorneyChanged,
            changed_by,
            AuditDetails::transition(
                previous
                    .lead_attorney_id
                    .as_ref()
                    .map_or("none", UserId::as_str),
                lawyer_id.as_str(),
            ),
        );
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error if the case is missing or closed.
    pub fn add_document(
        &self,
        case_id: CaseId,
        title: &str,
        content: &str,
        created_by: &UserId,
    ) -> Result<Case, CoreError> {
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        self.modify_open_case(case_id, created_by, "document_added", |case| {
            case.documents.push(CaseDocument {
                id: item_id("doc", now),
                title: title.to_string(),
                content: content.to_string(),
                created_by: created_by.clone(),
                created_at: now,
            });
        })
    }

    /// # Errors
    ///
    /// Returns an error if the case is missing or closed.
    pub fn add_note(
        &self,
        case_id: CaseId,
        content: &str,
        created_by: &UserId,
        is_internal: bool,
    ) -> Result<Case, CoreError> {
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        self.modify_open_case(case_id, created_by, "note_added", |case| {
            case.notes.push(CaseNote {
                id: item_id("note", now),
                content: content.to_string(),
                created_by: created_by.clone(),
                created_at: now,
                is_internal,
            });
        })
    }

    /// # Errors
    ///
    /// Returns an error if the case is missing or closed.
    pub fn update_priority(
        &self,
        case_id: CaseId,
        priority: CasePriority,
        changed_by: &UserId,
    ) -> Result<Case, CoreError> {
        self.modify_open_case(case_id, changed_by, "priority_changed", |case| {
            case.priority = priority;
        })
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn get_case(&self, case_id: CaseId) -> Result<Option<Case>, CoreError> {
        Ok(self.cases.find_by_id(case_id)?)
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn find_by_case_number(
        &self,
        guild_id: &GuildId,
        case_number: &CaseNumber,
    ) -> Result<Option<Case>, CoreError> {
        Ok(self.cases.find_by_case_number(guild_id, case_number)?)
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn list_cases_by_status(
        &self,
        guild_id: &GuildId,
        status: CaseStatus,
    ) -> Result<Vec<Case>, CoreError> {
        Ok(self.cases.find_by_status(guild_id, status)?)
    }

    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn list_cases_for_lawyer(
        &self,
        guild_id: &GuildId,
        lawyer_id: &UserId,
    ) -> Result<Vec<Case>, CoreError> {
        Ok(self.cases.find_by_lawyer(guild_id, lawyer_id)?)
    }

    fn load(&self, case_id: CaseId) -> Result<Case, CoreError> {
        self.cases.find_by_id(case_id)?.ok_or(CoreError::CaseNotFound)
    }

    /// Loads a case and checks that `transition` may start from its status.
    fn load_for_transition(
        &self,
        case_id: CaseId,
        transition: CaseTransition,
    ) -> Result<Case, CoreError> {
        let case: Case = self.load(case_id)?;
        if transition.permits(case.status) {
            Ok(case)
        } else {
            Err(CoreError::InvalidCaseStatus {
                transition,
                status: case.status,
            })
        }
    }

    /// Writes a transition conditionally on the status it started from.
    ///
    /// When the write loses a race the case is re-read so the error reports
    /// the status the winner left behind.
    fn write_transition(
        &self,
        case: &Case,
        expected: CaseStatus,
        transition: CaseTransition,
    ) -> Result<Case, CoreError> {
        if let Some(updated) = self.cases.conditional_update_status(case, expected)? {
            return Ok(updated);
        }
        match self.cases.find_by_id(case.id)? {
            Some(current) => Err(CoreError::InvalidCaseStatus {
                transition,
                status: current.status,
            }),
            None => Err(CoreError::CaseNotFound),
        }
    }

    fn modify_open_case(
        &self,
        case_id: CaseId,
        actor_id: &UserId,
        change: &str,
        mut apply: impl FnMut(&mut Case),
    ) -> Result<Case, CoreError> {
        let updated: Case = match self.edit_open_case(case_id, |case| {
            apply(case);
            Ok(true)
        })? {
            CaseEdit::Unchanged(case) | CaseEdit::Written { updated: case, .. } => case,
        };

        debug!(case_id = %case_id, change, "Updated case");
        self.record(
            &updated,
            AuditAction::CaseUpdated,
            actor_id,
            AuditDetails::new().with_metadata("change", change),
        );
        Ok(updated)
    }

    /// Applies `edit` to a fresh read of an open case and writes it.
    ///
    /// The write is guarded by the status that was read. When a transition
    /// lands in between, the case is read again and `edit` re-applied, so a
    /// case closed meanwhile fails the open check instead of being reopened.
    /// `edit` returns `false` to leave the case unwritten.
    fn edit_open_case(
        &self,
        case_id: CaseId,
        mut edit: impl FnMut(&mut Case) -> Result<bool, CoreError>,
    ) -> Result<CaseEdit, CoreError> {
        for _ in 0..EDIT_ATTEMPTS {
            let previous: Case = self.load(case_id)?;
            previous.ensure_open()?;
            let mut case: Case = previous.clone();
            if !edit(&mut case)? {
                return Ok(CaseEdit::Unchanged(case));
            }
            case.updated_at = OffsetDateTime::now_utc();
            if let Some(updated) = self.cases.update(&case)? {
                return Ok(CaseEdit::Written { previous, updated });
            }
            debug!(
                case_id = %case_id,
                status = %previous.status,
                "Case status moved during edit"
            );
        }
        Err(RepositoryError::Conflict(format!("case {case_id} kept changing during edit")).into())
    }

    fn record(&self, case: &Case, action: AuditAction, actor_id: &UserId, details: AuditDetails) {
        let entry: AuditLogEntry = AuditLogEntry::new(
            case.guild_id.clone(),
            action,
            actor_id.clone(),
            Some(case.id.to_string()),
            details,
        );
        audit_trail::record(self.audit.as_ref(), &entry);
    }
}

/// Applies the closing fields shared by close and decline.
pub(crate) fn close_with(
    mut case: Case,
    closed_by: &UserId,
    result: CaseResult,
    result_notes: Option<String>,
) -> Case {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    case.status = CaseStatus::Closed;
    case.result = Some(result);
    case.result_notes = result_notes;
    case.closed_by = Some(closed_by.clone());
    case.closed_at = Some(now);
    case.updated_at = now;
    case
}

fn item_id(prefix: &str, now: OffsetDateTime) -> String {
    format!(
        "{prefix}_{}_{:08x}",
        now.unix_timestamp_nanos(),
        rand::random::<u32>()
    )
}
