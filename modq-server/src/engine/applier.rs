//! Applies approved modifications to the target data
//!
//! Every applier checks that the data it is about to change still matches
//! what the submitter saw, and reports a terminal status rather than an
//! error. Callers run the applier inside the resolution transaction, under
//! a savepoint that is rolled back unless the result is Applied.

use modq_common::db::{ModificationStatus, ModificationType};
use modq_common::{Error, Result};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::db::store::{self, NewTrack, ResolutionCandidate};

/// Apply a modification and return its terminal status
///
/// Never returns Open. Store failures surface as Error.
pub async fn apply(conn: &mut SqliteConnection, candidate: &ResolutionCandidate) -> ModificationStatus {
    let Some(mod_type) = candidate.mod_type else {
        warn!("Modification {} has an unrecognized type - marking Error", candidate.id);
        return ModificationStatus::Error;
    };

    let result = match mod_type {
        ModificationType::EditArtistName
        | ModificationType::EditArtistSortName
        | ModificationType::EditAlbumName
        | ModificationType::EditTrackName
        | ModificationType::EditTrackNumber => apply_edit(conn, mod_type, candidate).await,
        ModificationType::MergeArtist => apply_merge_artist(conn, candidate).await,
        ModificationType::AddTrack => apply_add_track(conn, candidate).await,
    };

    match result {
        Ok(status) => status,
        Err(e) => {
            warn!("Applying modification {} ({}) failed: {}", candidate.id, mod_type, e);
            ModificationStatus::Error
        }
    }
}

/// Conditional single-column update
///
/// The write only happens if the column still holds the recorded previous
/// value; zero affected rows means the row drifted (or is gone).
async fn apply_edit(
    conn: &mut SqliteConnection,
    mod_type: ModificationType,
    candidate: &ResolutionCandidate,
) -> Result<ModificationStatus> {
    let result = match mod_type {
        ModificationType::EditTrackNumber => {
            let previous = parse_track_number(&candidate.previous_value)?;
            let new = parse_track_number(&candidate.new_value)?;
            sqlx::query("UPDATE tracks SET sequence = ? WHERE id = ? AND sequence = ?")
                .bind(new)
                .bind(candidate.target_row_id)
                .bind(previous)
                .execute(&mut *conn)
                .await?
        }
        _ => {
            let sql = match mod_type {
                ModificationType::EditArtistName => {
                    "UPDATE artists SET name = ? WHERE id = ? AND name = ?"
                }
                ModificationType::EditArtistSortName => {
                    "UPDATE artists SET sort_name = ? WHERE id = ? AND sort_name = ?"
                }
                ModificationType::EditAlbumName => {
                    "UPDATE albums SET name = ? WHERE id = ? AND name = ?"
                }
                ModificationType::EditTrackName => {
                    "UPDATE tracks SET name = ? WHERE id = ? AND name = ?"
                }
                other => {
                    return Err(Error::Internal(format!("{} is not an edit", other)));
                }
            };
            sqlx::query(sql)
                .bind(&candidate.new_value)
                .bind(candidate.target_row_id)
                .bind(&candidate.previous_value)
                .execute(&mut *conn)
                .await?
        }
    };

    if result.rows_affected() == 1 {
        Ok(ModificationStatus::Applied)
    } else {
        Ok(ModificationStatus::FailedDependency)
    }
}

/// Merge the target artist into the artist named by the new value
async fn apply_merge_artist(
    conn: &mut SqliteConnection,
    candidate: &ResolutionCandidate,
) -> Result<ModificationStatus> {
    let loser = candidate.target_row_id;

    let current = store::get_artist(&mut *conn, loser).await?;
    match current {
        Some(artist) if artist.name == candidate.previous_value => {}
        _ => return Ok(ModificationStatus::FailedDependency),
    }

    let Some(winner) =
        store::find_other_artist_by_name(&mut *conn, &candidate.new_value, loser).await?
    else {
        return Ok(ModificationStatus::FailedDependency);
    };

    let albums = sqlx::query("UPDATE albums SET artist_id = ? WHERE artist_id = ?")
        .bind(winner)
        .bind(loser)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let tracks = sqlx::query("UPDATE tracks SET artist_id = ? WHERE artist_id = ?")
        .bind(winner)
        .bind(loser)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM artists WHERE id = ?")
        .bind(loser)
        .execute(&mut *conn)
        .await?;

    store::set_modification_artist(&mut *conn, candidate.id, winner).await?;

    info!(
        "Merged artist {} into {} ({} albums, {} tracks moved)",
        loser, winner, albums, tracks
    );
    Ok(ModificationStatus::Applied)
}

/// Insert the packed track under the recorded artist and target album
async fn apply_add_track(
    conn: &mut SqliteConnection,
    candidate: &ResolutionCandidate,
) -> Result<ModificationStatus> {
    let payload = AddTrackPayload::parse(&candidate.new_value)?;

    let track_id = store::create_track(
        &mut *conn,
        &NewTrack {
            artist_id: candidate.artist_id,
            album_id: candidate.target_row_id,
            name: &payload.name,
            sequence: payload.sequence,
            length_ms: payload.length_ms,
        },
    )
    .await?;

    info!(
        "Added track {} to album {} for modification {}",
        track_id, candidate.target_row_id, candidate.id
    );
    Ok(ModificationStatus::Applied)
}

pub fn parse_track_number(value: &str) -> Result<i64> {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::InvalidInput(format!("invalid track number {:?}", value))),
    }
}

/// New-value payload of an AddTrack modification
///
/// Newline-delimited: track name, track number, optional length in ms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTrackPayload {
    pub name: String,
    pub sequence: i64,
    pub length_ms: Option<i64>,
}

impl AddTrackPayload {
    pub fn parse(packed: &str) -> Result<Self> {
        let mut lines = packed.lines();

        let name = lines.next().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(Error::InvalidInput("add-track payload has no track name".to_string()));
        }

        let sequence = lines
            .next()
            .ok_or_else(|| Error::InvalidInput("add-track payload has no track number".to_string()))
            .and_then(parse_track_number)?;

        let length_ms = match lines.next().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(ms) if ms >= 0 => Some(ms),
                _ => {
                    return Err(Error::InvalidInput(format!("invalid track length {:?}", raw)));
                }
            },
        };

        if lines.any(|line| !line.trim().is_empty()) {
            return Err(Error::InvalidInput("add-track payload has extra fields".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            sequence,
            length_ms,
        })
    }

    pub fn encode(&self) -> String {
        match self.length_ms {
            Some(ms) => format!("{}\n{}\n{}", self.name, self.sequence, ms),
            None => format!("{}\n{}", self.name, self.sequence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{create_album, create_artist, create_moderator, get_resolution_candidate, NewModification};
    use modq_common::db::open_in_memory;
    use modq_common::time::now;
    use sqlx::SqlitePool;

    async fn candidate(
        pool: &SqlitePool,
        mod_type: ModificationType,
        target_row_id: i64,
        artist_id: i64,
        previous: &str,
        new: &str,
    ) -> ResolutionCandidate {
        let moderator = create_moderator(pool, "submitter").await.unwrap();
        let id = store::insert_modification(
            pool,
            &NewModification {
                mod_type,
                target_row_id,
                artist_id,
                moderator_id: moderator,
                previous_value: previous,
                new_value: new,
                submitted_at: now(),
            },
        )
        .await
        .unwrap();
        get_resolution_candidate(pool, id).await.unwrap().unwrap()
    }

    #[test]
    fn test_payload_parse_with_length() {
        let payload = AddTrackPayload::parse("Intro\n1\n93000").unwrap();
        assert_eq!(payload.name, "Intro");
        assert_eq!(payload.sequence, 1);
        assert_eq!(payload.length_ms, Some(93000));
    }

    #[test]
    fn test_payload_parse_without_length() {
        let payload = AddTrackPayload::parse("Outro\n12").unwrap();
        assert_eq!(payload.length_ms, None);
        assert_eq!(payload.encode(), "Outro\n12");
    }

    #[test]
    fn test_payload_rejects_malformed() {
        assert!(AddTrackPayload::parse("").is_err());
        assert!(AddTrackPayload::parse("Name only").is_err());
        assert!(AddTrackPayload::parse("Name\nseven").is_err());
        assert!(AddTrackPayload::parse("Name\n0").is_err());
        assert!(AddTrackPayload::parse("Name\n3\n-5").is_err());
        assert!(AddTrackPayload::parse("Name\n3\n100\nextra").is_err());
    }

    #[tokio::test]
    async fn test_edit_applies_when_value_matches() {
        let pool = open_in_memory().await.unwrap();
        let artist = create_artist(&pool, "Old Name", "Old Name").await.unwrap();
        let c = candidate(&pool, ModificationType::EditArtistName, artist, artist, "Old Name", "New Name").await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(apply(&mut conn, &c).await, ModificationStatus::Applied);
        drop(conn);

        let artist = store::get_artist(&pool, artist).await.unwrap().unwrap();
        assert_eq!(artist.name, "New Name");
    }

    #[tokio::test]
    async fn test_edit_fails_dependency_when_value_drifted() {
        let pool = open_in_memory().await.unwrap();
        let artist = create_artist(&pool, "Drifted", "Drifted").await.unwrap();
        let c = candidate(&pool, ModificationType::EditArtistSortName, artist, artist, "Old", "New").await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(apply(&mut conn, &c).await, ModificationStatus::FailedDependency);
        drop(conn);

        let artist = store::get_artist(&pool, artist).await.unwrap().unwrap();
        assert_eq!(artist.sort_name, "Drifted");
    }

    #[tokio::test]
    async fn test_merge_fails_when_winner_missing() {
        let pool = open_in_memory().await.unwrap();
        let loser = create_artist(&pool, "Beatles", "Beatles").await.unwrap();
        let c = candidate(&pool, ModificationType::MergeArtist, loser, loser, "Beatles", "The Beatles").await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(apply(&mut conn, &c).await, ModificationStatus::FailedDependency);
        drop(conn);

        assert!(store::get_artist(&pool, loser).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_track_into_missing_album_is_error() {
        let pool = open_in_memory().await.unwrap();
        let artist = create_artist(&pool, "Artist", "Artist").await.unwrap();
        let album = create_album(&pool, artist, "Album").await.unwrap();
        let mut c = candidate(&pool, ModificationType::AddTrack, album, artist, "", "Bonus\n13").await;
        c.target_row_id = 9999;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(apply(&mut conn, &c).await, ModificationStatus::Error);
    }

    #[tokio::test]
    async fn test_unrecognized_type_is_error() {
        let pool = open_in_memory().await.unwrap();
        let artist = create_artist(&pool, "Artist", "Artist").await.unwrap();
        let mut c = candidate(&pool, ModificationType::EditArtistName, artist, artist, "Artist", "X").await;
        c.mod_type = None;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(apply(&mut conn, &c).await, ModificationStatus::Error);
        drop(conn);

        let artist = store::get_artist(&pool, artist).await.unwrap().unwrap();
        assert_eq!(artist.name, "Artist");
    }
}
