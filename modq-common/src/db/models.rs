//! Database models
//!
//! Enumerations are stored as integer codes. Each enum carries a static
//! code table plus a display name, so no lookup state lives at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Table that a modification's target row lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Artist,
    Album,
    Track,
}

impl TargetTable {
    pub fn table_name(self) -> &'static str {
        match self {
            TargetTable::Artist => "artists",
            TargetTable::Album => "albums",
            TargetTable::Track => "tracks",
        }
    }
}

/// Kind of change a modification proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    EditArtistName,
    EditArtistSortName,
    EditAlbumName,
    EditTrackName,
    EditTrackNumber,
    MergeArtist,
    AddTrack,
}

impl ModificationType {
    pub const ALL: [ModificationType; 7] = [
        ModificationType::EditArtistName,
        ModificationType::EditArtistSortName,
        ModificationType::EditAlbumName,
        ModificationType::EditTrackName,
        ModificationType::EditTrackNumber,
        ModificationType::MergeArtist,
        ModificationType::AddTrack,
    ];

    pub fn code(self) -> i64 {
        match self {
            ModificationType::EditArtistName => 1,
            ModificationType::EditArtistSortName => 2,
            ModificationType::EditAlbumName => 3,
            ModificationType::EditTrackName => 4,
            ModificationType::EditTrackNumber => 5,
            ModificationType::MergeArtist => 6,
            ModificationType::AddTrack => 7,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModificationType::EditArtistName => "Edit Artist Name",
            ModificationType::EditArtistSortName => "Edit Artist Sortname",
            ModificationType::EditAlbumName => "Edit Album Name",
            ModificationType::EditTrackName => "Edit Track Name",
            ModificationType::EditTrackNumber => "Edit Track Number",
            ModificationType::MergeArtist => "Merge Artist",
            ModificationType::AddTrack => "Add Track",
        }
    }

    /// Table holding the row this type targets (and whose pending count it bumps)
    ///
    /// AddTrack targets the album the new track is added to.
    pub fn target_table(self) -> TargetTable {
        match self {
            ModificationType::EditArtistName
            | ModificationType::EditArtistSortName
            | ModificationType::MergeArtist => TargetTable::Artist,
            ModificationType::EditAlbumName | ModificationType::AddTrack => TargetTable::Album,
            ModificationType::EditTrackName | ModificationType::EditTrackNumber => {
                TargetTable::Track
            }
        }
    }

    /// Column the change is read from and written to; empty for AddTrack
    pub fn target_column(self) -> &'static str {
        match self {
            ModificationType::EditArtistName
            | ModificationType::EditAlbumName
            | ModificationType::EditTrackName
            | ModificationType::MergeArtist => "name",
            ModificationType::EditArtistSortName => "sort_name",
            ModificationType::EditTrackNumber => "sequence",
            ModificationType::AddTrack => "",
        }
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle status of a modification
///
/// Open is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationStatus {
    Open,
    Applied,
    FailedVote,
    FailedDependency,
    Error,
}

impl ModificationStatus {
    pub const ALL: [ModificationStatus; 5] = [
        ModificationStatus::Open,
        ModificationStatus::Applied,
        ModificationStatus::FailedVote,
        ModificationStatus::FailedDependency,
        ModificationStatus::Error,
    ];

    pub fn code(self) -> i64 {
        match self {
            ModificationStatus::Open => 1,
            ModificationStatus::Applied => 2,
            ModificationStatus::FailedVote => 3,
            ModificationStatus::FailedDependency => 4,
            ModificationStatus::Error => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModificationStatus::Open => "Open",
            ModificationStatus::Applied => "Applied",
            ModificationStatus::FailedVote => "Failed vote",
            ModificationStatus::FailedDependency => "Failed dependency",
            ModificationStatus::Error => "Error",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ModificationStatus::Open
    }
}

impl fmt::Display for ModificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A moderator's position on one modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Yes,
    No,
    Abstain,
}

impl VoteValue {
    pub fn code(self) -> i64 {
        match self {
            VoteValue::Yes => 1,
            VoteValue::No => 0,
            VoteValue::Abstain => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(VoteValue::Yes),
            0 => Some(VoteValue::No),
            -1 => Some(VoteValue::Abstain),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VoteValue::Yes => "Yes",
            VoteValue::No => "No",
            VoteValue::Abstain => "Abstain",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A proposed change to a shared record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub id: i64,
    pub target_table: String,
    pub target_column: String,
    pub target_row_id: i64,
    pub artist_id: i64,
    pub mod_type: ModificationType,
    pub previous_value: String,
    pub new_value: String,
    pub submitted_at: DateTime<Utc>,
    pub moderator_id: i64,
    pub yes_votes: i64,
    pub no_votes: i64,
    pub status: ModificationStatus,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Modification {
    /// Moment after which the modification is resolved by majority
    pub fn expires_at(&self, voting_period: Duration) -> DateTime<Utc> {
        crate::time::add_saturating(self.submitted_at, voting_period)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, voting_period: Duration) -> bool {
        now >= self.expires_at(voting_period)
    }
}

/// Moderator identity with reputation counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorAccount {
    pub id: i64,
    pub name: String,
    pub accepted_count: i64,
    pub rejected_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub mod_pending: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub artist_id: i64,
    pub name: String,
    pub mod_pending: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub artist_id: i64,
    pub album_id: i64,
    pub name: String,
    pub sequence: i64,
    pub length_ms: Option<i64>,
    pub mod_pending: i64,
}
