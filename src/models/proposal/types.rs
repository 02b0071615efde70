use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeline::TimelineEntry;
use crate::models::workflow::{Action, ProposalStatus, Snapshot};

/// A proposal record with its owner's username.
#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub id: i64,
    pub owner_id: i64,
    pub owner_username: String,
    pub title: String,
    pub description: String,
    pub status: ProposalStatus,
    pub current_step: i32,
    pub rejection_reason: Option<String>,
    pub plagiarism_percent: Option<f64>,
    pub evaluation_mark_1: Option<i64>,
    pub evaluation_mark_2: Option<i64>,
    pub seminar_attendance: Option<bool>,
    pub seminar_result: Option<bool>,
    pub committee_approved: Option<bool>,
    pub document: Option<String>,
    pub revised_document: Option<String>,
    pub budget_document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            has_budget_document: self.budget_document.is_some(),
        }
    }

    pub fn attachment(&self, kind: FileKind) -> Option<&str> {
        match kind {
            FileKind::Document => self.document.as_deref(),
            FileKind::Revised => self.revised_document.as_deref(),
            FileKind::Budget => self.budget_document.as_deref(),
        }
    }
}

/// Proposal detail including its timeline, for `GET /api/proposals/{id}/`.
#[derive(Debug, Serialize)]
pub struct ProposalDetail {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub timeline: Vec<TimelineEntry>,
}

/// Pagination wrapper for proposal lists.
#[derive(Debug, Serialize)]
pub struct ProposalPage {
    pub items: Vec<Proposal>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Attachment slots on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Revised,
    Budget,
}

impl FileKind {
    /// Parse the `{kind}` path segment of the file routes.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "document" => Some(FileKind::Document),
            "revised" => Some(FileKind::Revised),
            "budget" => Some(FileKind::Budget),
            _ => None,
        }
    }

    /// Subdirectory of the media root the file is stored in.
    pub fn directory(&self) -> &'static str {
        match self {
            FileKind::Document => "proposals",
            FileKind::Revised => "revised_proposals",
            FileKind::Budget => "budgets",
        }
    }

    /// Proposal column holding this kind's stored reference.
    pub fn column(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Revised => "revised_document",
            FileKind::Budget => "budget_document",
        }
    }

    /// Workflow action an upload of this kind performs.
    pub fn upload_action(&self) -> Action {
        match self {
            FileKind::Document => Action::UploadDocument,
            FileKind::Revised => Action::UploadRevisedDocument,
            FileKind::Budget => Action::UploadBudget,
        }
    }
}

/// A new stored file for one attachment slot.
///
/// `replaces` is the reference the slot held when the upload was decided;
/// the write only lands if the slot still holds it.
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    pub kind: FileKind,
    pub reference: &'a str,
    pub replaces: Option<&'a str>,
}

/// Writes that ride along with a workflow decision.
#[derive(Debug, Default)]
pub struct Changes<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub attachment: Option<Attachment<'a>>,
}

/// Body of `POST /api/proposals/` and `PUT /api/proposals/{id}/`.
#[derive(Debug, Deserialize)]
pub struct ProposalRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Query string of `GET /api/proposals/`.
#[derive(Debug, Deserialize)]
pub struct ProposalListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FormatCheckRequest {
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlagiarismCheckRequest {
    #[serde(alias = "percentage")]
    pub percent: f64,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub mark1: i64,
    pub mark2: i64,
}

#[derive(Debug, Deserialize)]
pub struct SeminarRequest {
    #[serde(alias = "attended")]
    pub attendance: bool,
    #[serde(alias = "accepted")]
    pub result: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommitteeRequest {
    #[serde(alias = "accepted")]
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct RectorRequest {
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string of the upload route.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}
