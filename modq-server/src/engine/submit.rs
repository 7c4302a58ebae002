//! Submission of new modifications

use chrono::{DateTime, Utc};
use modq_common::db::ModificationType;
use modq_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::store::{self, NewModification};
use crate::engine::applier::{parse_track_number, AddTrackPayload};

/// A proposed change as supplied by the surrounding system
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitRequest {
    pub mod_type: ModificationType,
    pub target_row_id: i64,
    pub artist_id: i64,
    pub moderator_id: i64,
    /// Value the submitter last saw; empty for AddTrack
    #[serde(default)]
    pub previous_value: String,
    pub new_value: String,
}

/// Result of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub id: i64,
    /// Stored type; differs from the request when a rename became a merge
    pub mod_type: ModificationType,
}

/// Queue a modification and bump its target row's pending count
///
/// An artist rename to a name another artist already has is stored as a
/// merge into that artist. Conflicting open modifications on the same row
/// are allowed.
pub async fn submit(pool: &SqlitePool, request: &SubmitRequest, now: DateTime<Utc>) -> Result<Submitted> {
    validate(request)?;

    let target_table = request.mod_type.target_table();
    let mut tx = pool.begin().await?;

    if !store::increment_pending(&mut *tx, target_table, request.target_row_id).await? {
        tx.rollback().await?;
        return Err(Error::NotFound(format!(
            "{} row {}",
            target_table.table_name(),
            request.target_row_id
        )));
    }

    let mut mod_type = request.mod_type;
    if mod_type == ModificationType::EditArtistName {
        if let Some(existing) =
            store::find_other_artist_by_name(&mut *tx, &request.new_value, request.target_row_id)
                .await?
        {
            debug!(
                "Artist name {:?} already used by artist {} - submitting as merge",
                request.new_value, existing
            );
            mod_type = ModificationType::MergeArtist;
        }
    }

    let id = store::insert_modification(
        &mut *tx,
        &NewModification {
            mod_type,
            target_row_id: request.target_row_id,
            artist_id: request.artist_id,
            moderator_id: request.moderator_id,
            previous_value: &request.previous_value,
            new_value: &request.new_value,
            submitted_at: now,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        "Modification {} submitted: {} on {} {} by moderator {}",
        id,
        mod_type,
        target_table.table_name(),
        request.target_row_id,
        request.moderator_id
    );
    Ok(Submitted { id, mod_type })
}

/// Reject payloads the applier could never use
fn validate(request: &SubmitRequest) -> Result<()> {
    match request.mod_type {
        ModificationType::EditTrackNumber => {
            parse_track_number(&request.previous_value)?;
            parse_track_number(&request.new_value)?;
        }
        ModificationType::AddTrack => {
            AddTrackPayload::parse(&request.new_value)?;
        }
        ModificationType::EditArtistName
        | ModificationType::EditArtistSortName
        | ModificationType::EditAlbumName
        | ModificationType::EditTrackName
        | ModificationType::MergeArtist => {
            if request.new_value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "{} requires a non-empty new value",
                    request.mod_type
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mod_type: ModificationType, previous: &str, new: &str) -> SubmitRequest {
        SubmitRequest {
            mod_type,
            target_row_id: 1,
            artist_id: 1,
            moderator_id: 1,
            previous_value: previous.to_string(),
            new_value: new.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_name_rejected() {
        let result = validate(&request(ModificationType::EditTrackName, "Song", "  "));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_track_number() {
        assert!(validate(&request(ModificationType::EditTrackNumber, "3", "4")).is_ok());
        assert!(validate(&request(ModificationType::EditTrackNumber, "3", "four")).is_err());
        assert!(validate(&request(ModificationType::EditTrackNumber, "", "4")).is_err());
    }

    #[test]
    fn test_validate_add_track_payload() {
        assert!(validate(&request(ModificationType::AddTrack, "", "Hidden Track\n14\n30000")).is_ok());
        assert!(validate(&request(ModificationType::AddTrack, "", "Hidden Track")).is_err());
    }
}
