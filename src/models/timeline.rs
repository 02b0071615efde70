use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::errors::AppError;

/// One entry of a proposal's history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TimelineEntry {
    pub id: i64,
    pub proposal_id: i64,
    pub step_name: String,
    pub action: String,
    pub actor_id: Option<i64>,
    pub actor_name: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append an entry. Takes a connection so callers can keep it inside their transaction.
pub async fn record(
    conn: &mut PgConnection,
    proposal_id: i64,
    step_name: &str,
    action: &str,
    actor_id: i64,
    details: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO proposal_timeline (proposal_id, step_name, action, actor_id, details) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(proposal_id)
    .bind(step_name)
    .bind(action)
    .bind(actor_id)
    .bind(details)
    .execute(conn)
    .await?;
    Ok(())
}

/// Entries for a proposal, oldest first.
pub async fn find_for_proposal(pool: &PgPool, proposal_id: i64) -> Result<Vec<TimelineEntry>, AppError> {
    let entries = sqlx::query_as::<_, TimelineEntry>(
        "SELECT t.id, t.proposal_id, t.step_name, t.action, t.actor_id, \
                u.username AS actor_name, t.details, t.created_at \
         FROM proposal_timeline t \
         LEFT JOIN users u ON u.id = t.actor_id \
         WHERE t.proposal_id = $1 \
         ORDER BY t.created_at, t.id",
    )
    .bind(proposal_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}
