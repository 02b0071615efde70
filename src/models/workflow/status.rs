use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a proposal. Stored verbatim (variant name) in `proposals.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Submitted,
    FormatAccepted,
    FormatRejected,
    PlagiarismChecked,
    PlagiarismRejected,
    Evaluated,
    EvaluationRejected,
    SeminarPassed,
    SeminarRejected,
    CommitteeApproved,
    CommitteeRejected,
    FinalAccepted,
    RectorRejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 13] = [
        ProposalStatus::Submitted,
        ProposalStatus::FormatAccepted,
        ProposalStatus::FormatRejected,
        ProposalStatus::PlagiarismChecked,
        ProposalStatus::PlagiarismRejected,
        ProposalStatus::Evaluated,
        ProposalStatus::EvaluationRejected,
        ProposalStatus::SeminarPassed,
        ProposalStatus::SeminarRejected,
        ProposalStatus::CommitteeApproved,
        ProposalStatus::CommitteeRejected,
        ProposalStatus::FinalAccepted,
        ProposalStatus::RectorRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Submitted => "Submitted",
            ProposalStatus::FormatAccepted => "FormatAccepted",
            ProposalStatus::FormatRejected => "FormatRejected",
            ProposalStatus::PlagiarismChecked => "PlagiarismChecked",
            ProposalStatus::PlagiarismRejected => "PlagiarismRejected",
            ProposalStatus::Evaluated => "Evaluated",
            ProposalStatus::EvaluationRejected => "EvaluationRejected",
            ProposalStatus::SeminarPassed => "SeminarPassed",
            ProposalStatus::SeminarRejected => "SeminarRejected",
            ProposalStatus::CommitteeApproved => "CommitteeApproved",
            ProposalStatus::CommitteeRejected => "CommitteeRejected",
            ProposalStatus::FinalAccepted => "FinalAccepted",
            ProposalStatus::RectorRejected => "RectorRejected",
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            ProposalStatus::FormatRejected
                | ProposalStatus::PlagiarismRejected
                | ProposalStatus::EvaluationRejected
                | ProposalStatus::SeminarRejected
                | ProposalStatus::CommitteeRejected
                | ProposalStatus::RectorRejected
        )
    }

    /// Terminal proposals accept no further writes.
    pub fn is_terminal(&self) -> bool {
        self.is_rejected() || *self == ProposalStatus::FinalAccepted
    }

    /// Pipeline step (1..=6) the proposal is waiting on, or ended at when terminal.
    pub fn step(&self) -> i32 {
        match self {
            ProposalStatus::Submitted | ProposalStatus::FormatRejected => 1,
            ProposalStatus::FormatAccepted | ProposalStatus::PlagiarismRejected => 2,
            ProposalStatus::PlagiarismChecked | ProposalStatus::EvaluationRejected => 3,
            ProposalStatus::Evaluated | ProposalStatus::SeminarRejected => 4,
            ProposalStatus::SeminarPassed | ProposalStatus::CommitteeRejected => 5,
            ProposalStatus::CommitteeApproved
            | ProposalStatus::FinalAccepted
            | ProposalStatus::RectorRejected => 6,
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProposalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown proposal status '{s}'"))
    }
}

/// The six review stages, plus the submission step that precedes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Submission,
    Format,
    Plagiarism,
    Evaluation,
    Seminar,
    Committee,
    Rector,
}

impl Stage {
    /// Human-readable name used in timeline entries.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Submission => "Submission",
            Stage::Format => "Format Check",
            Stage::Plagiarism => "Plagiarism Check",
            Stage::Evaluation => "Evaluation",
            Stage::Seminar => "Seminar",
            Stage::Committee => "Research Committee",
            Stage::Rector => "Rector Approval",
        }
    }
}
