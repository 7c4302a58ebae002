//! Moderation listings
//!
//! Modifications are returned denormalized with the owning artist's name,
//! the submitter's name and the viewing moderator's own vote.

use chrono::{DateTime, Utc};
use modq_common::db::{Modification, VoteValue};
use modq_common::{EngineConfig, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::db::store::{modification_from_row, MODIFICATION_COLUMNS};
use crate::pagination::calculate_pagination;

/// Which modifications a moderator is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListFilter {
    /// Open modifications by other moderators that this moderator has not voted on
    PendingForOthers,
    /// Everything this moderator submitted, any status
    MineAll,
    /// Modifications this moderator has voted on, with that vote
    MineWithMyVote,
}

impl ListFilter {
    /// WHERE clause; `?1` is the viewing moderator
    fn condition(self) -> &'static str {
        match self {
            ListFilter::PendingForOthers => "m.status = 1 AND m.moderator_id != ?1 AND v.id IS NULL",
            ListFilter::MineAll => "m.moderator_id = ?1",
            ListFilter::MineWithMyVote => "v.id IS NOT NULL",
        }
    }

    /// Pending work is shown oldest first, the moderator's own history newest first
    fn order(self) -> &'static str {
        match self {
            ListFilter::PendingForOthers => "m.submitted_at ASC, m.id ASC",
            ListFilter::MineAll | ListFilter::MineWithMyVote => "m.submitted_at DESC, m.id DESC",
        }
    }
}

/// One row of a moderation listing
#[derive(Debug, Clone, Serialize)]
pub struct ModerationEntry {
    #[serde(flatten)]
    pub modification: Modification,
    pub type_name: &'static str,
    pub status_name: &'static str,
    /// None once the artist has been merged away
    pub artist_name: Option<String>,
    pub moderator_name: String,
    pub my_vote: Option<VoteValue>,
    pub vote_text: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// One page of a moderation listing
#[derive(Debug, Clone, Serialize)]
pub struct ModerationPage {
    pub filter: ListFilter,
    pub moderator_id: i64,
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub entries: Vec<ModerationEntry>,
}

const FROM_CLAUSE: &str = r#"
    FROM modifications m
    JOIN moderators mo ON mo.id = m.moderator_id
    LEFT JOIN artists a ON a.id = m.artist_id
    LEFT JOIN votes v ON v.modification_id = m.id AND v.moderator_id = ?1
"#;

/// List modifications for a moderator
pub async fn moderation_list(
    pool: &SqlitePool,
    config: &EngineConfig,
    filter: ListFilter,
    moderator_id: i64,
    page: i64,
) -> Result<ModerationPage> {
    let count_sql = format!("SELECT COUNT(*) {} WHERE {}", FROM_CLAUSE, filter.condition());
    let total_results: i64 = sqlx::query_scalar(&count_sql)
        .bind(moderator_id)
        .fetch_one(pool)
        .await?;

    let p = calculate_pagination(total_results, page, config.page_size);

    let sql = format!(
        "SELECT {}, a.name AS artist_name, mo.name AS moderator_name, v.vote AS my_vote {} WHERE {} ORDER BY {} LIMIT ?2 OFFSET ?3",
        MODIFICATION_COLUMNS,
        FROM_CLAUSE,
        filter.condition(),
        filter.order()
    );
    let rows = sqlx::query(&sql)
        .bind(moderator_id)
        .bind(config.page_size)
        .bind(p.offset)
        .fetch_all(pool)
        .await?;

    let entries = rows
        .iter()
        .map(|row| entry_from_row(row, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModerationPage {
        filter,
        moderator_id,
        total_results,
        page: p.page,
        page_size: config.page_size,
        total_pages: p.total_pages,
        entries,
    })
}

/// Fetch one modification, denormalized from `viewer_id`'s point of view
pub async fn get_entry(
    pool: &SqlitePool,
    config: &EngineConfig,
    id: i64,
    viewer_id: Option<i64>,
) -> Result<ModerationEntry> {
    let sql = format!(
        "SELECT {}, a.name AS artist_name, mo.name AS moderator_name, v.vote AS my_vote {} WHERE m.id = ?2",
        MODIFICATION_COLUMNS, FROM_CLAUSE
    );
    let row = sqlx::query(&sql)
        .bind(viewer_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("modification {}", id)))?;

    entry_from_row(&row, config)
}

fn entry_from_row(row: &SqliteRow, config: &EngineConfig) -> Result<ModerationEntry> {
    let modification = modification_from_row(row)?;
    let my_vote = row
        .get::<Option<i64>, _>("my_vote")
        .and_then(VoteValue::from_code);

    Ok(ModerationEntry {
        type_name: modification.mod_type.name(),
        status_name: modification.status.name(),
        artist_name: row.get("artist_name"),
        moderator_name: row.get("moderator_name"),
        vote_text: my_vote.map(VoteValue::name).unwrap_or("Not voted"),
        my_vote,
        expires_at: modification.expires_at(config.voting_period),
        modification,
    })
}
