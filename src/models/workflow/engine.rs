use std::fmt;

use crate::models::user::Role;
use super::status::{ProposalStatus, Stage};

/// Plagiarism above this percentage rejects the proposal.
pub const PLAGIARISM_LIMIT_PERCENT: f64 = 20.0;
/// Combined evaluation marks below this total reject the proposal.
pub const EVALUATION_PASS_MARK: i64 = 65;

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Admin,
    Owner,
}

/// The authenticated caller as seen by the engine.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub role: Role,
    pub is_owner: bool,
}

impl Caller {
    fn may_act_as(&self, actor: ActorKind) -> bool {
        match actor {
            ActorKind::Admin => self.role == Role::Admin,
            ActorKind::Owner => self.role == Role::Participant && self.is_owner,
        }
    }
}

/// Every write a proposal can receive after creation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    EditContent,
    UploadDocument,
    FormatCheck { accepted: bool, reason: Option<String> },
    PlagiarismCheck { percent: f64 },
    Evaluate { mark1: i64, mark2: i64 },
    SeminarDecision { attended: bool, passed: bool },
    UploadBudget,
    UploadRevisedDocument,
    CommitteeDecision { approved: bool },
    RectorDecision { accepted: bool, reason: Option<String> },
}

/// Row of the transition table: the stage an action belongs to, the only
/// status it may be applied in, and who may apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub stage: Stage,
    pub from: ProposalStatus,
    pub actor: ActorKind,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::EditContent => "edit_content",
            Action::UploadDocument => "upload_document",
            Action::FormatCheck { .. } => "format_check",
            Action::PlagiarismCheck { .. } => "plagiarism_check",
            Action::Evaluate { .. } => "evaluate",
            Action::SeminarDecision { .. } => "seminar_decision",
            Action::UploadBudget => "upload_budget",
            Action::UploadRevisedDocument => "upload_revised_document",
            Action::CommitteeDecision { .. } => "committee_decision",
            Action::RectorDecision { .. } => "rector_decision",
        }
    }

    pub fn rule(&self) -> Rule {
        use ActorKind::{Admin, Owner};
        use ProposalStatus as S;

        let (stage, from, actor) = match self {
            Action::EditContent | Action::UploadDocument => (Stage::Submission, S::Submitted, Owner),
            Action::FormatCheck { .. } => (Stage::Format, S::Submitted, Admin),
            Action::PlagiarismCheck { .. } => (Stage::Plagiarism, S::FormatAccepted, Admin),
            Action::Evaluate { .. } => (Stage::Evaluation, S::PlagiarismChecked, Admin),
            Action::SeminarDecision { .. } => (Stage::Seminar, S::Evaluated, Admin),
            Action::UploadBudget | Action::UploadRevisedDocument => {
                (Stage::Committee, S::SeminarPassed, Owner)
            }
            Action::CommitteeDecision { .. } => (Stage::Committee, S::SeminarPassed, Admin),
            Action::RectorDecision { .. } => (Stage::Rector, S::CommitteeApproved, Admin),
        };
        Rule { stage, from, actor }
    }
}

/// What the engine needs to know about the stored proposal.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub status: ProposalStatus,
    pub has_budget_document: bool,
}

/// Configurable bounds on stage inputs.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_evaluation_mark: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_evaluation_mark: 100 }
    }
}

/// Stage inputs to persist alongside the new status. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageFields {
    pub plagiarism_percent: Option<f64>,
    pub evaluation_mark_1: Option<i64>,
    pub evaluation_mark_2: Option<i64>,
    pub seminar_attendance: Option<bool>,
    pub seminar_result: Option<bool>,
    pub committee_approved: Option<bool>,
}

/// Outcome of a permitted action, ready to be applied by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub stage: Stage,
    pub from: ProposalStatus,
    pub to: ProposalStatus,
    pub fields: StageFields,
    pub rejection_reason: Option<String>,
    /// Short timeline verb, e.g. "Accepted".
    pub outcome: &'static str,
    pub details: String,
}

impl Decision {
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    Unauthorized(String),
    InvalidTransition { from: ProposalStatus, action: &'static str },
    Validation(String),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Unauthorized(msg) => write!(f, "{msg}"),
            WorkflowError::InvalidTransition { from, action } => {
                write!(f, "Cannot apply '{action}' to a proposal in state {from}")
            }
            WorkflowError::Validation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for WorkflowError {}

/// Decide the effect of `action` on a proposal.
///
/// Checks run in a fixed order: caller, predecessor state, then input ranges.
/// The result is pure; persisting it (conditionally on `from`) is the store's job.
pub fn decide(
    snapshot: Snapshot,
    caller: Caller,
    action: &Action,
    limits: &Limits,
) -> Result<Decision, WorkflowError> {
    let rule = action.rule();

    if !caller.may_act_as(rule.actor) {
        let who = match rule.actor {
            ActorKind::Admin => "an admin",
            ActorKind::Owner => "the submitting participant",
        };
        return Err(WorkflowError::Unauthorized(format!(
            "Only {who} may perform '{}'",
            action.name()
        )));
    }

    if snapshot.status != rule.from {
        return Err(WorkflowError::InvalidTransition {
            from: snapshot.status,
            action: action.name(),
        });
    }

    let mut fields = StageFields::default();
    let accept = |to: ProposalStatus, details: String, fields: StageFields| Decision {
        stage: rule.stage,
        from: rule.from,
        to,
        fields,
        rejection_reason: None,
        outcome: "Accepted",
        details,
    };
    let reject = |to: ProposalStatus, reason: String, fields: StageFields| Decision {
        stage: rule.stage,
        from: rule.from,
        to,
        fields,
        rejection_reason: Some(reason.clone()),
        outcome: "Rejected",
        details: reason,
    };
    let unchanged = |outcome: &'static str, details: &str| Decision {
        stage: rule.stage,
        from: rule.from,
        to: rule.from,
        fields: StageFields::default(),
        rejection_reason: None,
        outcome,
        details: details.to_string(),
    };

    let decision = match action {
        Action::EditContent => unchanged("Updated", "Proposal content edited"),
        Action::UploadDocument => unchanged("Files Uploaded", "Proposal document uploaded"),
        Action::UploadBudget => unchanged("Files Uploaded", "Budget document uploaded"),
        Action::UploadRevisedDocument => {
            unchanged("Files Uploaded", "Revised proposal document uploaded")
        }

        Action::FormatCheck { accepted, reason } => {
            if *accepted {
                accept(ProposalStatus::FormatAccepted, "Format check passed".into(), fields)
            } else {
                let reason = non_empty(reason).unwrap_or("Format check failed").to_string();
                reject(ProposalStatus::FormatRejected, reason, fields)
            }
        }

        Action::PlagiarismCheck { percent } => {
            let percent = *percent;
            if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                return Err(WorkflowError::Validation(format!(
                    "Plagiarism percentage must be between 0 and 100, got {percent}"
                )));
            }
            fields.plagiarism_percent = Some(percent);
            if percent > PLAGIARISM_LIMIT_PERCENT {
                reject(
                    ProposalStatus::PlagiarismRejected,
                    format!("Plagiarism {percent}% exceeds {PLAGIARISM_LIMIT_PERCENT}%"),
                    fields,
                )
            } else {
                accept(
                    ProposalStatus::PlagiarismChecked,
                    format!("Plagiarism {percent}% within {PLAGIARISM_LIMIT_PERCENT}%"),
                    fields,
                )
            }
        }

        Action::Evaluate { mark1, mark2 } => {
            for (label, mark) in [("mark1", *mark1), ("mark2", *mark2)] {
                if mark < 0 || mark > limits.max_evaluation_mark {
                    return Err(WorkflowError::Validation(format!(
                        "{label} must be between 0 and {}, got {mark}",
                        limits.max_evaluation_mark
                    )));
                }
            }
            fields.evaluation_mark_1 = Some(*mark1);
            fields.evaluation_mark_2 = Some(*mark2);
            let total = mark1.checked_add(*mark2).ok_or_else(|| {
                WorkflowError::Validation(format!("Total of marks {mark1} and {mark2} is out of range"))
            })?;
            if total < EVALUATION_PASS_MARK {
                reject(
                    ProposalStatus::EvaluationRejected,
                    format!("Total marks {total} below {EVALUATION_PASS_MARK}"),
                    fields,
                )
            } else {
                accept(
                    ProposalStatus::Evaluated,
                    format!("Total marks {total} meet {EVALUATION_PASS_MARK}"),
                    fields,
                )
            }
        }

        Action::SeminarDecision { attended, passed } => {
            fields.seminar_attendance = Some(*attended);
            fields.seminar_result = Some(*passed);
            match (*attended, *passed) {
                (true, true) => {
                    accept(ProposalStatus::SeminarPassed, "Seminar successful".into(), fields)
                }
                (false, _) => reject(ProposalStatus::SeminarRejected, "Seminar not attended".into(), fields),
                (true, false) => {
                    reject(ProposalStatus::SeminarRejected, "Seminar presentation rejected".into(), fields)
                }
            }
        }

        Action::CommitteeDecision { approved } => {
            fields.committee_approved = Some(*approved);
            if *approved {
                if !snapshot.has_budget_document {
                    return Err(WorkflowError::Validation(
                        "A budget document must be uploaded before committee approval".into(),
                    ));
                }
                accept(ProposalStatus::CommitteeApproved, "Committee approved budget".into(), fields)
            } else {
                reject(ProposalStatus::CommitteeRejected, "Committee rejected".into(), fields)
            }
        }

        Action::RectorDecision { accepted, reason } => {
            if *accepted {
                accept(ProposalStatus::FinalAccepted, "Final approval granted".into(), fields)
            } else {
                let reason = non_empty(reason).unwrap_or("Rector rejected").to_string();
                reject(ProposalStatus::RectorRejected, reason, fields)
            }
        }
    };

    Ok(decision)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Caller = Caller { role: Role::Admin, is_owner: false };
    const OWNER: Caller = Caller { role: Role::Participant, is_owner: true };
    const STRANGER: Caller = Caller { role: Role::Participant, is_owner: false };

    fn at(status: ProposalStatus) -> Snapshot {
        Snapshot { status, has_budget_document: false }
    }

    fn run(status: ProposalStatus, caller: Caller, action: Action) -> Result<Decision, WorkflowError> {
        decide(at(status), caller, &action, &Limits::default())
    }

    /// Drive a proposal through a sequence of actions, feeding each result into the next.
    fn drive(actions: Vec<(Caller, Action)>) -> Result<ProposalStatus, WorkflowError> {
        let mut snapshot = at(ProposalStatus::Submitted);
        for (caller, action) in actions {
            let decision = decide(snapshot, caller, &action, &Limits::default())?;
            if action == Action::UploadBudget {
                snapshot.has_budget_document = true;
            }
            snapshot.status = decision.to;
        }
        Ok(snapshot.status)
    }

    #[test]
    fn plagiarism_threshold_splits_at_twenty_percent() {
        for percent in [0.0, 5.5, 10.0, 19.99, 20.0] {
            let d = run(ProposalStatus::FormatAccepted, ADMIN, Action::PlagiarismCheck { percent }).unwrap();
            assert_eq!(d.to, ProposalStatus::PlagiarismChecked, "percent {percent}");
            assert_eq!(d.fields.plagiarism_percent, Some(percent));
        }
        for percent in [20.01, 25.0, 50.0, 100.0] {
            let d = run(ProposalStatus::FormatAccepted, ADMIN, Action::PlagiarismCheck { percent }).unwrap();
            assert_eq!(d.to, ProposalStatus::PlagiarismRejected, "percent {percent}");
            assert!(d.rejection_reason.unwrap().contains(&percent.to_string()));
        }
    }

    #[test]
    fn plagiarism_out_of_range_is_a_validation_error() {
        for percent in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
            let err = run(ProposalStatus::FormatAccepted, ADMIN, Action::PlagiarismCheck { percent }).unwrap_err();
            assert!(matches!(err, WorkflowError::Validation(_)), "percent {percent}");
        }
    }

    #[test]
    fn evaluation_threshold_splits_at_sixty_five() {
        for mark1 in (0..=100).step_by(5) {
            for mark2 in (0..=100).step_by(7) {
                let d = run(ProposalStatus::PlagiarismChecked, ADMIN, Action::Evaluate { mark1, mark2 }).unwrap();
                let expected = if mark1 + mark2 < 65 {
                    ProposalStatus::EvaluationRejected
                } else {
                    ProposalStatus::Evaluated
                };
                assert_eq!(d.to, expected, "marks ({mark1}, {mark2})");
            }
        }
    }

    #[test]
    fn evaluation_marks_must_be_within_bounds() {
        let err = run(ProposalStatus::PlagiarismChecked, ADMIN, Action::Evaluate { mark1: -1, mark2: 70 }).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let err = run(ProposalStatus::PlagiarismChecked, ADMIN, Action::Evaluate { mark1: 150, mark2: 0 }).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let strict = Limits { max_evaluation_mark: 50 };
        let err = decide(at(ProposalStatus::PlagiarismChecked), ADMIN, &Action::Evaluate { mark1: 51, mark2: 20 }, &strict)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn evaluation_total_overflow_is_a_validation_error() {
        let unbounded = Limits { max_evaluation_mark: i64::MAX };
        let at_limit = Action::Evaluate { mark1: i64::MAX, mark2: 1 };
        let err = decide(at(ProposalStatus::PlagiarismChecked), ADMIN, &at_limit, &unbounded).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let fits = Action::Evaluate { mark1: i64::MAX - 1, mark2: 1 };
        let d = decide(at(ProposalStatus::PlagiarismChecked), ADMIN, &fits, &unbounded).unwrap();
        assert_eq!(d.to, ProposalStatus::Evaluated);
    }

    #[test]
    fn seminar_requires_attendance_and_a_pass() {
        let cases = [
            (true, true, ProposalStatus::SeminarPassed),
            (true, false, ProposalStatus::SeminarRejected),
            (false, true, ProposalStatus::SeminarRejected),
            (false, false, ProposalStatus::SeminarRejected),
        ];
        for (attended, passed, expected) in cases {
            let d = run(ProposalStatus::Evaluated, ADMIN, Action::SeminarDecision { attended, passed }).unwrap();
            assert_eq!(d.to, expected);
        }
    }

    #[test]
    fn format_rejection_keeps_admin_reason() {
        let d = run(
            ProposalStatus::Submitted,
            ADMIN,
            Action::FormatCheck { accepted: false, reason: Some("Invalid format".into()) },
        )
        .unwrap();
        assert_eq!(d.to, ProposalStatus::FormatRejected);
        assert_eq!(d.rejection_reason.as_deref(), Some("Invalid format"));

        let d = run(ProposalStatus::Submitted, ADMIN, Action::FormatCheck { accepted: false, reason: Some("  ".into()) })
            .unwrap();
        assert_eq!(d.rejection_reason.as_deref(), Some("Format check failed"));
    }

    #[test]
    fn committee_approval_needs_a_budget_document() {
        let err = run(ProposalStatus::SeminarPassed, ADMIN, Action::CommitteeDecision { approved: true }).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let snapshot = Snapshot { status: ProposalStatus::SeminarPassed, has_budget_document: true };
        let d = decide(snapshot, ADMIN, &Action::CommitteeDecision { approved: true }, &Limits::default()).unwrap();
        assert_eq!(d.to, ProposalStatus::CommitteeApproved);

        let d = run(ProposalStatus::SeminarPassed, ADMIN, Action::CommitteeDecision { approved: false }).unwrap();
        assert_eq!(d.to, ProposalStatus::CommitteeRejected);
    }

    #[test]
    fn admin_actions_refuse_participants() {
        let admin_actions = [
            Action::FormatCheck { accepted: true, reason: None },
            Action::PlagiarismCheck { percent: 1.0 },
            Action::Evaluate { mark1: 50, mark2: 50 },
            Action::SeminarDecision { attended: true, passed: true },
            Action::CommitteeDecision { approved: true },
            Action::RectorDecision { accepted: true, reason: None },
        ];
        for action in admin_actions {
            let from = action.rule().from;
            let err = decide(at(from), OWNER, &action, &Limits::default()).unwrap_err();
            assert!(matches!(err, WorkflowError::Unauthorized(_)), "{}", action.name());
        }
    }

    #[test]
    fn owner_actions_refuse_admins_and_strangers() {
        for caller in [ADMIN, STRANGER] {
            let err = run(ProposalStatus::SeminarPassed, caller, Action::UploadBudget).unwrap_err();
            assert!(matches!(err, WorkflowError::Unauthorized(_)));
            let err = run(ProposalStatus::Submitted, caller, Action::EditContent).unwrap_err();
            assert!(matches!(err, WorkflowError::Unauthorized(_)));
        }
    }

    #[test]
    fn uploads_leave_status_unchanged() {
        let d = run(ProposalStatus::SeminarPassed, OWNER, Action::UploadBudget).unwrap();
        assert_eq!(d.to, ProposalStatus::SeminarPassed);
        assert!(!d.changes_status());
        assert_eq!(d.stage, Stage::Committee);
    }

    #[test]
    fn every_action_outside_its_predecessor_state_is_an_invalid_transition() {
        let actions = [
            (ADMIN, Action::FormatCheck { accepted: true, reason: None }),
            (ADMIN, Action::PlagiarismCheck { percent: 1.0 }),
            (ADMIN, Action::Evaluate { mark1: 50, mark2: 50 }),
            (ADMIN, Action::SeminarDecision { attended: true, passed: true }),
            (OWNER, Action::UploadBudget),
            (OWNER, Action::UploadRevisedDocument),
            (ADMIN, Action::CommitteeDecision { approved: false }),
            (ADMIN, Action::RectorDecision { accepted: true, reason: None }),
            (OWNER, Action::EditContent),
            (OWNER, Action::UploadDocument),
        ];
        for (caller, action) in actions {
            for status in ProposalStatus::ALL {
                if status == action.rule().from {
                    continue;
                }
                let err = run(status, caller, action.clone()).unwrap_err();
                assert_eq!(
                    err,
                    WorkflowError::InvalidTransition { from: status, action: action.name() },
                );
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for status in ProposalStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for caller in [ADMIN, OWNER] {
                for action in [
                    Action::FormatCheck { accepted: true, reason: None },
                    Action::Evaluate { mark1: 50, mark2: 50 },
                    Action::UploadBudget,
                    Action::RectorDecision { accepted: true, reason: None },
                ] {
                    assert!(run(status, caller, action).is_err());
                }
            }
        }
    }

    #[test]
    fn plagiarism_rejection_blocks_evaluation() {
        let status = drive(vec![
            (ADMIN, Action::FormatCheck { accepted: true, reason: None }),
            (ADMIN, Action::PlagiarismCheck { percent: 25.0 }),
        ])
        .unwrap();
        assert_eq!(status, ProposalStatus::PlagiarismRejected);

        let err = run(status, ADMIN, Action::Evaluate { mark1: 40, mark2: 30 }).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn passing_marks_reach_evaluated() {
        let status = drive(vec![
            (ADMIN, Action::FormatCheck { accepted: true, reason: None }),
            (ADMIN, Action::PlagiarismCheck { percent: 10.0 }),
            (ADMIN, Action::Evaluate { mark1: 40, mark2: 30 }),
        ])
        .unwrap();
        assert_eq!(status, ProposalStatus::Evaluated);
    }

    #[test]
    fn happy_path_reaches_final_acceptance() {
        let status = drive(vec![
            (ADMIN, Action::FormatCheck { accepted: true, reason: None }),
            (ADMIN, Action::PlagiarismCheck { percent: 10.0 }),
            (ADMIN, Action::Evaluate { mark1: 35, mark2: 35 }),
            (ADMIN, Action::SeminarDecision { attended: true, passed: true }),
            (OWNER, Action::UploadBudget),
            (ADMIN, Action::CommitteeDecision { approved: true }),
            (ADMIN, Action::RectorDecision { accepted: true, reason: None }),
        ])
        .unwrap();
        assert_eq!(status, ProposalStatus::FinalAccepted);
        assert_eq!(status.step(), 6);
    }
}
