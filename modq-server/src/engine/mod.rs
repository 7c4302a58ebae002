//! Moderation engine
//!
//! Submission, the vote ledger, resolution, application, reputation and
//! listing. Every operation works directly against the shared store; the
//! store's transactions are the only coordination between workers.

pub mod applier;
pub mod listing;
pub mod reputation;
pub mod resolver;
pub mod submit;
pub mod sweep;
pub mod votes;

use modq_common::db::ModificationStatus;
use serde::Serialize;

pub use listing::{get_entry, moderation_list, ListFilter, ModerationEntry, ModerationPage};
pub use submit::{submit, SubmitRequest, Submitted};
pub use sweep::{spawn_sweeper, sweep_expired, SweepReport};
pub use votes::{cast_votes, Ballot, BallotOutcome};

/// A modification closed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub id: i64,
    pub status: ModificationStatus,
}
