use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::timeline;
use crate::models::workflow::{Decision, ProposalStatus, Stage};
use super::types::*;

const SELECT_PROPOSAL: &str = "\
    SELECT p.id, p.owner_id, u.username AS owner_username, p.title, p.description, \
           p.status, p.current_step, p.rejection_reason, p.plagiarism_percent, \
           p.evaluation_mark_1, p.evaluation_mark_2, p.seminar_attendance, \
           p.seminar_result, p.committee_approved, p.document, p.revised_document, \
           p.budget_document, p.created_at, p.updated_at \
    FROM proposals p \
    JOIN users u ON u.id = p.owner_id";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    owner_id: i64,
    owner_username: String,
    title: String,
    description: String,
    status: String,
    current_step: i32,
    rejection_reason: Option<String>,
    plagiarism_percent: Option<f64>,
    evaluation_mark_1: Option<i64>,
    evaluation_mark_2: Option<i64>,
    seminar_attendance: Option<bool>,
    seminar_result: Option<bool>,
    committee_approved: Option<bool>,
    document: Option<String>,
    revised_document: Option<String>,
    budget_document: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for Proposal {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let status: ProposalStatus = row
            .status
            .parse()
            .map_err(|e: String| AppError::Db(sqlx::Error::Decode(e.into())))?;
        Ok(Proposal {
            id: row.id,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            title: row.title,
            description: row.description,
            status,
            current_step: row.current_step,
            rejection_reason: row.rejection_reason,
            plagiarism_percent: row.plagiarism_percent,
            evaluation_mark_1: row.evaluation_mark_1,
            evaluation_mark_2: row.evaluation_mark_2,
            seminar_attendance: row.seminar_attendance,
            seminar_result: row.seminar_result,
            committee_approved: row.committee_approved,
            document: row.document,
            revised_document: row.revised_document,
            budget_document: row.budget_document,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Create a proposal in `Submitted` and record the submission on its timeline.
pub async fn create(
    pool: &PgPool,
    owner_id: i64,
    owner_username: &str,
    title: &str,
    description: &str,
) -> Result<Proposal, AppError> {
    let mut tx = pool.begin().await?;

    let initial = ProposalStatus::Submitted;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO proposals (owner_id, title, description, status, current_step) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(owner_id)
    .bind(title.trim())
    .bind(description.trim())
    .bind(initial.as_str())
    .bind(initial.step())
    .fetch_one(&mut *tx)
    .await?;

    timeline::record(
        &mut tx,
        id,
        Stage::Submission.label(),
        "Proposal Submitted",
        owner_id,
        &format!("Initial submission by {owner_username}"),
    )
    .await?;

    tx.commit().await?;

    find_by_id(pool, id).await?.ok_or(AppError::NotFound)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Proposal>, AppError> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_PROPOSAL} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Proposal::try_from).transpose()
}

/// List proposals newest first.
///
/// `owner_id = None`  -> every proposal (admin view).
/// `owner_id = Some(id)` -> only that participant's proposals.
pub async fn find_page(
    pool: &PgPool,
    owner_id: Option<i64>,
    status: Option<ProposalStatus>,
    page: i64,
    per_page: i64,
) -> Result<ProposalPage, AppError> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = (page - 1) * per_page;
    let status = status.map(|s| s.as_str());

    // NULL parameters disable their filter.
    let filter = "($1::BIGINT IS NULL OR p.owner_id = $1) AND ($2::TEXT IS NULL OR p.status = $2)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM proposals p WHERE {filter}"
    ))
    .bind(owner_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, Row>(&format!(
        "{SELECT_PROPOSAL} WHERE {filter} ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4"
    ))
    .bind(owner_id)
    .bind(status)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(Proposal::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProposalPage { items, page, per_page, total })
}

/// Persist a workflow decision.
///
/// The update only applies while the stored status still equals `decision.from`
/// and, for uploads, while the attachment slot still holds `replaces`. If another
/// request got there first, nothing is written and `InvalidTransition` is
/// returned. The timeline entry commits with the update.
pub async fn apply(
    pool: &PgPool,
    proposal_id: i64,
    decision: &Decision,
    changes: &Changes<'_>,
    actor_id: i64,
) -> Result<Proposal, AppError> {
    let reference = |kind: FileKind| {
        changes
            .attachment
            .filter(|a| a.kind == kind)
            .map(|a| a.reference)
    };
    // Column names come from FileKind, never from input.
    let slot_guard = match changes.attachment {
        Some(a) => format!(" AND {} IS NOT DISTINCT FROM $17", a.kind.column()),
        None => String::new(),
    };

    let sql = format!(
        "UPDATE proposals SET \
             status = $3, \
             current_step = $4, \
             rejection_reason = COALESCE($5, rejection_reason), \
             plagiarism_percent = COALESCE($6, plagiarism_percent), \
             evaluation_mark_1 = COALESCE($7, evaluation_mark_1), \
             evaluation_mark_2 = COALESCE($8, evaluation_mark_2), \
             seminar_attendance = COALESCE($9, seminar_attendance), \
             seminar_result = COALESCE($10, seminar_result), \
             committee_approved = COALESCE($11, committee_approved), \
             title = COALESCE($12, title), \
             description = COALESCE($13, description), \
             document = COALESCE($14, document), \
             revised_document = COALESCE($15, revised_document), \
             budget_document = COALESCE($16, budget_document), \
             updated_at = NOW() \
         WHERE id = $1 AND status = $2{slot_guard} \
         RETURNING id"
    );

    let mut tx = pool.begin().await?;

    let mut query = sqlx::query_scalar::<_, i64>(&sql)
        .bind(proposal_id)
        .bind(decision.from.as_str())
        .bind(decision.to.as_str())
        .bind(decision.to.step())
        .bind(decision.rejection_reason.as_deref())
        .bind(decision.fields.plagiarism_percent)
        .bind(decision.fields.evaluation_mark_1)
        .bind(decision.fields.evaluation_mark_2)
        .bind(decision.fields.seminar_attendance)
        .bind(decision.fields.seminar_result)
        .bind(decision.fields.committee_approved)
        .bind(changes.title.map(str::trim))
        .bind(changes.description.map(str::trim))
        .bind(reference(FileKind::Document))
        .bind(reference(FileKind::Revised))
        .bind(reference(FileKind::Budget));
    if let Some(a) = changes.attachment {
        query = query.bind(a.replaces);
    }

    let updated: Option<i64> = query.fetch_optional(&mut *tx).await?;

    if updated.is_none() {
        tx.rollback().await?;
        let current = find_by_id(pool, proposal_id).await?.ok_or(AppError::NotFound)?;
        return Err(AppError::InvalidTransition(format!(
            "Proposal {proposal_id} changed (now {}) before '{}' could be applied",
            current.status,
            decision.stage.label()
        )));
    }

    timeline::record(
        &mut tx,
        proposal_id,
        decision.stage.label(),
        decision.outcome,
        actor_id,
        &decision.details,
    )
    .await?;

    tx.commit().await?;

    log::info!(
        "Proposal {proposal_id}: {} -> {} ({}) by user {actor_id}",
        decision.from,
        decision.to,
        decision.outcome
    );

    find_by_id(pool, proposal_id).await?.ok_or(AppError::NotFound)
}

/// Delete a proposal. Returns the stored attachment paths so the caller can remove them,
/// or `None` if no such proposal exists.
pub async fn delete(pool: &PgPool, proposal_id: i64) -> Result<Option<Vec<String>>, AppError> {
    let row: Option<(Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
        "DELETE FROM proposals WHERE id = $1 \
         RETURNING document, revised_document, budget_document",
    )
    .bind(proposal_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(a, b, c)| [a, b, c].into_iter().flatten().collect()))
}
