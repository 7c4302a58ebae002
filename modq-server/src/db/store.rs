//! Typed storage access
//!
//! Every engine component reads and writes through these functions. Each
//! one runs exactly one parameterized statement and accepts any SQLite
//! executor, so callers decide whether it runs on the pool or inside a
//! transaction.

use chrono::{DateTime, Utc};
use modq_common::db::{
    Album, Artist, ModeratorAccount, Modification, ModificationStatus, ModificationType,
    TargetTable, Track, VoteValue,
};
use modq_common::time::{from_millis, to_millis};
use modq_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

/// Columns selected for every modification read
pub(crate) const MODIFICATION_COLUMNS: &str = "m.id, m.target_table, m.target_column, m.target_row_id, m.artist_id, \
     m.mod_type, m.previous_value, m.new_value, m.submitted_at, m.moderator_id, \
     m.yes_votes, m.no_votes, m.status, m.closed_at";

/// Decode a row selected with [`MODIFICATION_COLUMNS`]
pub(crate) fn modification_from_row(row: &SqliteRow) -> Result<Modification> {
    let id: i64 = row.get("id");
    let type_code: i64 = row.get("mod_type");
    let status_code: i64 = row.get("status");

    let mod_type = ModificationType::from_code(type_code).ok_or_else(|| {
        Error::Internal(format!("modification {} has unknown type code {}", id, type_code))
    })?;
    let status = ModificationStatus::from_code(status_code).ok_or_else(|| {
        Error::Internal(format!("modification {} has unknown status code {}", id, status_code))
    })?;

    Ok(Modification {
        id,
        target_table: row.get("target_table"),
        target_column: row.get("target_column"),
        target_row_id: row.get("target_row_id"),
        artist_id: row.get("artist_id"),
        mod_type,
        previous_value: row.get("previous_value"),
        new_value: row.get("new_value"),
        submitted_at: from_millis(row.get("submitted_at")),
        moderator_id: row.get("moderator_id"),
        yes_votes: row.get("yes_votes"),
        no_votes: row.get("no_votes"),
        status,
        closed_at: row.get::<Option<i64>, _>("closed_at").map(from_millis),
    })
}

/// What the resolver needs to decide and close a modification
///
/// Type and status stay optional so a row with an unrecognized code can
/// still be closed as Error instead of blocking every sweep.
#[derive(Debug, Clone)]
pub struct ResolutionCandidate {
    pub id: i64,
    pub target_table: Option<TargetTable>,
    pub target_row_id: i64,
    pub artist_id: i64,
    pub mod_type: Option<ModificationType>,
    pub previous_value: String,
    pub new_value: String,
    pub submitted_at: DateTime<Utc>,
    pub moderator_id: i64,
    pub yes_votes: i64,
    pub no_votes: i64,
    pub status: Option<ModificationStatus>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl ResolutionCandidate {
    /// Open and not yet claimed by a resolver
    pub fn is_open(&self) -> bool {
        self.status == Some(ModificationStatus::Open) && self.closed_at.is_none()
    }
}

/// Fields written by submission
#[derive(Debug, Clone)]
pub struct NewModification<'a> {
    pub mod_type: ModificationType,
    pub target_row_id: i64,
    pub artist_id: i64,
    pub moderator_id: i64,
    pub previous_value: &'a str,
    pub new_value: &'a str,
    pub submitted_at: DateTime<Utc>,
}

/// Fields written when a track row is created
#[derive(Debug, Clone)]
pub struct NewTrack<'a> {
    pub artist_id: i64,
    pub album_id: i64,
    pub name: &'a str,
    pub sequence: i64,
    pub length_ms: Option<i64>,
}

// ----------------------------------------------------------------------------
// Moderators
// ----------------------------------------------------------------------------

pub async fn create_moderator<'e, E>(executor: E, name: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO moderators (name) VALUES (?)")
        .bind(name)
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_moderator<'e, E>(executor: E, id: i64) -> Result<Option<ModeratorAccount>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, name, accepted_count, rejected_count FROM moderators WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| ModeratorAccount {
        id: row.get("id"),
        name: row.get("name"),
        accepted_count: row.get("accepted_count"),
        rejected_count: row.get("rejected_count"),
    }))
}

// ----------------------------------------------------------------------------
// Target rows
// ----------------------------------------------------------------------------

pub async fn create_artist<'e, E>(executor: E, name: &str, sort_name: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO artists (name, sort_name) VALUES (?, ?)")
        .bind(name)
        .bind(sort_name)
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_artist<'e, E>(executor: E, id: i64) -> Result<Option<Artist>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT id, name, sort_name, mod_pending FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|row| Artist {
        id: row.get("id"),
        name: row.get("name"),
        sort_name: row.get("sort_name"),
        mod_pending: row.get("mod_pending"),
    }))
}

/// Find an artist named exactly `name`, other than `excluding`
pub async fn find_other_artist_by_name<'e, E>(
    executor: E,
    name: &str,
    excluding: i64,
) -> Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar("SELECT id FROM artists WHERE name = ? AND id != ? ORDER BY id LIMIT 1")
        .bind(name)
        .bind(excluding)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

pub async fn create_album<'e, E>(executor: E, artist_id: i64, name: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO albums (artist_id, name) VALUES (?, ?)")
        .bind(artist_id)
        .bind(name)
        .execute(executor)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_album<'e, E>(executor: E, id: i64) -> Result<Option<Album>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT id, artist_id, name, mod_pending FROM albums WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|row| Album {
        id: row.get("id"),
        artist_id: row.get("artist_id"),
        name: row.get("name"),
        mod_pending: row.get("mod_pending"),
    }))
}

pub async fn create_track<'e, E>(executor: E, track: &NewTrack<'_>) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO tracks (artist_id, album_id, name, sequence, length_ms) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(track.artist_id)
    .bind(track.album_id)
    .bind(track.name)
    .bind(track.sequence)
    .bind(track.length_ms)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_track<'e, E>(executor: E, id: i64) -> Result<Option<Track>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, artist_id, album_id, name, sequence, length_ms, mod_pending FROM tracks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| Track {
        id: row.get("id"),
        artist_id: row.get("artist_id"),
        album_id: row.get("album_id"),
        name: row.get("name"),
        sequence: row.get("sequence"),
        length_ms: row.get("length_ms"),
        mod_pending: row.get("mod_pending"),
    }))
}

/// Increment a target row's pending count; returns false if the row is missing
pub async fn increment_pending<'e, E>(executor: E, table: TargetTable, row_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = match table {
        TargetTable::Artist => "UPDATE artists SET mod_pending = mod_pending + 1 WHERE id = ?",
        TargetTable::Album => "UPDATE albums SET mod_pending = mod_pending + 1 WHERE id = ?",
        TargetTable::Track => "UPDATE tracks SET mod_pending = mod_pending + 1 WHERE id = ?",
    };
    let result = sqlx::query(sql).bind(row_id).execute(executor).await?;
    Ok(result.rows_affected() == 1)
}

/// Decrement a target row's pending count, never below zero
///
/// A missing row (e.g. an artist removed by a merge) is not an error.
pub async fn decrement_pending<'e, E>(executor: E, table: TargetTable, row_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = match table {
        TargetTable::Artist => {
            "UPDATE artists SET mod_pending = mod_pending - 1 WHERE id = ? AND mod_pending > 0"
        }
        TargetTable::Album => {
            "UPDATE albums SET mod_pending = mod_pending - 1 WHERE id = ? AND mod_pending > 0"
        }
        TargetTable::Track => {
            "UPDATE tracks SET mod_pending = mod_pending - 1 WHERE id = ? AND mod_pending > 0"
        }
    };
    let result = sqlx::query(sql).bind(row_id).execute(executor).await?;
    Ok(result.rows_affected() == 1)
}

// ----------------------------------------------------------------------------
// Modifications
// ----------------------------------------------------------------------------

pub async fn insert_modification<'e, E>(executor: E, new: &NewModification<'_>) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO modifications (
            target_table, target_column, target_row_id, artist_id, mod_type,
            previous_value, new_value, submitted_at, moderator_id,
            yes_votes, no_votes, status
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)
        "#,
    )
    .bind(new.mod_type.target_table().table_name())
    .bind(new.mod_type.target_column())
    .bind(new.target_row_id)
    .bind(new.artist_id)
    .bind(new.mod_type.code())
    .bind(new.previous_value)
    .bind(new.new_value)
    .bind(to_millis(new.submitted_at))
    .bind(new.moderator_id)
    .bind(ModificationStatus::Open.code())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_modification<'e, E>(executor: E, id: i64) -> Result<Option<Modification>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM modifications m WHERE m.id = ?", MODIFICATION_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    row.as_ref().map(modification_from_row).transpose()
}

pub async fn get_resolution_candidate<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<ResolutionCandidate>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, target_table, target_row_id, artist_id, mod_type, previous_value,
               new_value, submitted_at, moderator_id, yes_votes, no_votes, status, closed_at
        FROM modifications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| {
        let mod_type = ModificationType::from_code(row.get("mod_type"));
        let target_table = mod_type
            .map(ModificationType::target_table)
            .or_else(|| table_from_name(row.get::<&str, _>("target_table")));

        ResolutionCandidate {
            id: row.get("id"),
            target_table,
            target_row_id: row.get("target_row_id"),
            artist_id: row.get("artist_id"),
            mod_type,
            previous_value: row.get("previous_value"),
            new_value: row.get("new_value"),
            submitted_at: from_millis(row.get("submitted_at")),
            moderator_id: row.get("moderator_id"),
            yes_votes: row.get("yes_votes"),
            no_votes: row.get("no_votes"),
            status: ModificationStatus::from_code(row.get("status")),
            closed_at: row.get::<Option<i64>, _>("closed_at").map(from_millis),
        }
    }))
}

fn table_from_name(name: &str) -> Option<TargetTable> {
    [TargetTable::Artist, TargetTable::Album, TargetTable::Track]
        .into_iter()
        .find(|t| t.table_name() == name)
}

/// Ids of open modifications submitted at or before `cutoff`, oldest first
pub async fn open_ids_submitted_before<'e, E>(executor: E, cutoff: DateTime<Utc>) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids = sqlx::query_scalar(
        "SELECT id FROM modifications WHERE status = ? AND closed_at IS NULL AND submitted_at <= ? ORDER BY submitted_at, id",
    )
    .bind(ModificationStatus::Open.code())
    .bind(to_millis(cutoff))
    .fetch_all(executor)
    .await?;
    Ok(ids)
}

/// Take the close-exactly-once claim on an open modification
///
/// Returns false if the modification is not open or another resolver
/// already claimed it.
pub async fn claim_modification<'e, E>(executor: E, id: i64, closed_at: DateTime<Utc>) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE modifications SET closed_at = ? WHERE id = ? AND status = ? AND closed_at IS NULL",
    )
    .bind(to_millis(closed_at))
    .bind(id)
    .bind(ModificationStatus::Open.code())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_status<'e, E>(executor: E, id: i64, status: ModificationStatus) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE modifications SET status = ? WHERE id = ?")
        .bind(status.code())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_modification_artist<'e, E>(executor: E, id: i64, artist_id: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE modifications SET artist_id = ? WHERE id = ?")
        .bind(artist_id)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

// ----------------------------------------------------------------------------
// Votes
// ----------------------------------------------------------------------------

/// Record a vote if the modification is open and not the voter's own
///
/// Returns false when the vote was ignored: duplicate, closed, own or
/// missing modification.
pub async fn insert_vote<'e, E>(
    executor: E,
    moderator_id: i64,
    modification_id: i64,
    value: VoteValue,
    cast_at: DateTime<Utc>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO votes (moderator_id, modification_id, vote, cast_at)
        SELECT ?, id, ?, ?
        FROM modifications
        WHERE id = ? AND status = ? AND closed_at IS NULL AND moderator_id != ?
        "#,
    )
    .bind(moderator_id)
    .bind(value.code())
    .bind(to_millis(cast_at))
    .bind(modification_id)
    .bind(ModificationStatus::Open.code())
    .bind(moderator_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Add one to the yes or no tally; abstentions are never counted
pub async fn increment_tally<'e, E>(executor: E, modification_id: i64, value: VoteValue) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = match value {
        VoteValue::Yes => "UPDATE modifications SET yes_votes = yes_votes + 1 WHERE id = ?",
        VoteValue::No => "UPDATE modifications SET no_votes = no_votes + 1 WHERE id = ?",
        VoteValue::Abstain => return Ok(()),
    };
    sqlx::query(sql).bind(modification_id).execute(executor).await?;
    Ok(())
}

pub async fn get_vote<'e, E>(executor: E, moderator_id: i64, modification_id: i64) -> Result<Option<VoteValue>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let code: Option<i64> =
        sqlx::query_scalar("SELECT vote FROM votes WHERE moderator_id = ? AND modification_id = ?")
            .bind(moderator_id)
            .bind(modification_id)
            .fetch_optional(executor)
            .await?;
    Ok(code.and_then(VoteValue::from_code))
}
