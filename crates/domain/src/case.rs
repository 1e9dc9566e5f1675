// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Case records and the case lifecycle.
//!
//! The lifecycle is `pending -> in-progress -> closed`, with a decline edge
//! from either open state directly to `closed`. No other edge exists.

use crate::error::DomainError;
use crate::types::{CaseId, ChannelId, GuildId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "closed")]
    Closed,
}

impl CaseStatus {
    /// Returns the status as stored and displayed.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }

    /// Statuses that count toward a client's open case load.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - Pending → `InProgress` (accept)
    /// - `InProgress` → Closed (close or decline)
    /// - Pending → Closed (decline)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress | Self::Pending, Self::Closed)
        )
    }
}

impl FromStr for CaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(DomainError::InvalidCaseStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransition {
    /// A lawyer takes on a pending case.
    Accept,
    /// An in-progress case is concluded with a result.
    Close,
    /// A case is dismissed before or during work on it.
    Decline,
}

impl CaseTransition {
    /// Past-tense verb used in "Case cannot be <verb>" messages.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Close => "closed",
            Self::Decline => "declined",
        }
    }

    /// The status a case ends up in after this transition.
    #[must_use]
    pub const fn target(&self) -> CaseStatus {
        match self {
            Self::Accept => CaseStatus::InProgress,
            Self::Close | Self::Decline => CaseStatus::Closed,
        }
    }

    /// Whether this transition may start from `current`.
    ///
    /// Accept needs exactly pending and close needs exactly in-progress;
    /// decline accepts either open status.
    #[must_use]
    pub const fn permits(&self, current: CaseStatus) -> bool {
        match self {
            Self::Accept => matches!(current, CaseStatus::Pending),
            Self::Close => matches!(current, CaseStatus::InProgress),
            Self::Decline => current.is_open(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl CasePriority {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for CasePriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(DomainError::InvalidCasePriority(s.to_string())),
        }
    }
}

impl std::fmt::Display for CasePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded when a case is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseResult {
    Win,
    Loss,
    Settlement,
    Dismissed,
    Withdrawn,
}

impl CaseResult {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Settlement => "settlement",
            Self::Dismissed => "dismissed",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for CaseResult {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "settlement" => Ok(Self::Settlement),
            "dismissed" => Ok(Self::Dismissed),
            "withdrawn" => Ok(Self::Withdrawn),
            _ => Err(DomainError::InvalidCaseResult(s.to_string())),
        }
    }
}

impl std::fmt::Display for CaseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replaces every character outside `[A-Za-z0-9_-]` with a hyphen.
#[must_use]
pub fn sanitize_client_username(username: &str) -> String {
    username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// A guild-unique case number of the form `<year>-<seq>-<username>`.
///
/// The sequence is zero padded to four digits. Once assigned to a case
/// the number never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseNumber(String);

impl CaseNumber {
    /// Builds a case number from its parts.
    ///
    /// # Arguments
    ///
    /// * `year` - The creation year
    /// * `sequence` - The guild counter value reserved for this case
    /// * `client_username` - The client's username, sanitized before use
    #[must_use]
    pub fn generate(year: i32, sequence: u32, client_username: &str) -> Self {
        Self(format!(
            "{year}-{sequence:04}-{}",
            sanitize_client_username(client_username)
        ))
    }

    /// Wraps an already-assigned case number loaded from storage.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document attached to a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A note on a case. Internal notes are hidden from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseNote {
    pub id: String,
    pub content: String,
    pub created_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_internal: bool,
}

/// The data needed to insert a new case. The case number is already reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub guild_id: GuildId,
    pub case_number: CaseNumber,
    pub client_id: UserId,
    pub client_username: String,
    pub title: String,
    pub description: String,
    pub priority: CasePriority,
    pub created_at: OffsetDateTime,
}

/// A legal case handled by the firm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub id: CaseId,
    pub guild_id: GuildId,
    pub case_number: CaseNumber,
    pub client_id: UserId,
    pub client_username: String,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub priority: CasePriority,
    /// Assigned lawyers in assignment order, without duplicates.
    pub assigned_lawyer_ids: Vec<UserId>,
    /// Always one of `assigned_lawyer_ids` when set.
    pub lead_attorney_id: Option<UserId>,
    pub documents: Vec<CaseDocument>,
    pub notes: Vec<CaseNote>,
    pub result: Option<CaseResult>,
    pub result_notes: Option<String>,
    pub closed_by: Option<UserId>,
    pub closed_at: Option<OffsetDateTime>,
    pub channel_id: Option<ChannelId>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Case {
    #[must_use]
    pub fn has_lawyer(&self, lawyer_id: &UserId) -> bool {
        self.assigned_lawyer_ids.contains(lawyer_id)
    }

    #[must_use]
    pub fn is_lead_attorney(&self, lawyer_id: &UserId) -> bool {
        self.lead_attorney_id.as_ref() == Some(lawyer_id)
    }

    /// Adds a lawyer to the case.
    ///
    /// The first lawyer assigned to a case without a lead becomes lead.
    /// Returns `false` without changing anything if the lawyer is already assigned.
    pub fn assign_lawyer(&mut self, lawyer_id: &UserId) -> bool {
        if self.has_lawyer(lawyer_id) {
            return false;
        }
        self.assigned_lawyer_ids.push(lawyer_id.clone());
        if self.lead_attorney_id.is_none() {
            self.lead_attorney_id = Some(lawyer_id.clone());
        }
        true
    }

    /// Removes a lawyer from the case.
    ///
    /// Removing the lead promotes the first remaining lawyer (by assignment
    /// order) to lead, or clears the lead when nobody remains.
    /// Returns `false` if the lawyer was not assigned.
    pub fn unassign_lawyer(&mut self, lawyer_id: &UserId) -> bool {
        let Some(position) = self
            .assigned_lawyer_ids
            .iter()
            .position(|assigned| assigned == lawyer_id)
        else {
            return false;
        };
        self.assigned_lawyer_ids.remove(position);
        if self.is_lead_attorney(lawyer_id) {
            self.lead_attorney_id = self.assigned_lawyer_ids.first().cloned();
        }
        true
    }

    /// Makes an already-assigned lawyer the lead attorney.
    ///
    /// # Errors
    ///
    /// Returns an error if the lawyer is not assigned to the case.
    pub fn set_lead_attorney(&mut self, lawyer_id: &UserId) -> Result<(), DomainError> {
        if !self.has_lawyer(lawyer_id) {
            return Err(DomainError::LeadAttorneyNotAssigned(lawyer_id.clone()));
        }
        self.lead_attorney_id = Some(lawyer_id.clone());
        Ok(())
    }

    /// Rejects modifications to closed cases.
    ///
    /// # Errors
    ///
    /// Returns an error if the case is closed.
    pub fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(DomainError::CaseClosed(self.case_number.to_string()))
        }
    }

    /// Checks the lead-attorney membership invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if the lead attorney is not among the assigned lawyers.
    pub fn validate_invariants(&self) -> Result<(), DomainError> {
        match &self.lead_attorney_id {
            Some(lead) if !self.has_lawyer(lead) => {
                Err(DomainError::LeadAttorneyNotAssigned(lead.clone()))
            }
            _ => Ok(()),
        }
    }
}
