//! Proposal review pipeline: the status enum and the transition table that
//! every stage write is checked against.

pub mod engine;
pub mod status;

pub use engine::{
    decide, Action, ActorKind, Caller, Decision, Limits, Rule, Snapshot, StageFields,
    WorkflowError, EVALUATION_PASS_MARK, PLAGIARISM_LIMIT_PERCENT,
};
pub use status::{ProposalStatus, Stage};
