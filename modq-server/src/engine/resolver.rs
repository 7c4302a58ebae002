//! Decides when an open modification closes and with what status
//!
//! Decision policy, in priority order:
//! 1. Voting period elapsed: yes > no attempts to apply, anything else
//!    (including a tie) fails the vote.
//! 2. Before timeout: `threshold` yes votes with no "no" votes attempts to
//!    apply; `threshold` no votes with no "yes" votes fails the vote.
//!    Everything else stays open.
//!
//! Closing runs in one transaction that starts by claiming the row, so a
//! modification is closed at most once even with concurrent resolvers.

use chrono::{DateTime, Utc};
use modq_common::db::ModificationStatus;
use modq_common::time::add_saturating;
use modq_common::{EngineConfig, Result};
use sqlx::{Connection, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::store::{self, ResolutionCandidate};
use crate::engine::{applier, reputation};

/// Outcome of the decision policy for one modification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the modification to the applier
    Apply,
    /// Close as FailedVote
    Reject,
    /// Leave open
    Wait,
}

/// Pure decision policy
pub fn decide(yes_votes: i64, no_votes: i64, expired: bool, unanimity_threshold: i64) -> Verdict {
    if expired {
        return if yes_votes > no_votes {
            Verdict::Apply
        } else {
            Verdict::Reject
        };
    }

    // At-or-above: two concurrent ballots can step a tally past the threshold
    // before either resolution check runs.
    if yes_votes >= unanimity_threshold && no_votes == 0 {
        Verdict::Apply
    } else if no_votes >= unanimity_threshold && yes_votes == 0 {
        Verdict::Reject
    } else {
        Verdict::Wait
    }
}

fn verdict_for(candidate: &ResolutionCandidate, config: &EngineConfig, now: DateTime<Utc>) -> Verdict {
    let expires_at = add_saturating(candidate.submitted_at, config.voting_period);
    decide(
        candidate.yes_votes,
        candidate.no_votes,
        now >= expires_at,
        config.unanimity_threshold,
    )
}

/// Resolve one modification if the policy says it should close
///
/// Returns the terminal status when this call closed the modification, or
/// None when it stays open, is already closed, does not exist, or another
/// worker closed it first.
pub async fn resolve(
    pool: &SqlitePool,
    config: &EngineConfig,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<ModificationStatus>> {
    // Cheap unlocked check first; most vote-triggered checks end here
    let Some(snapshot) = store::get_resolution_candidate(pool, id).await? else {
        debug!("Modification {} not found - nothing to resolve", id);
        return Ok(None);
    };
    if !snapshot.is_open() || verdict_for(&snapshot, config, now) == Verdict::Wait {
        debug!(
            "Modification {} stays as is (yes={}, no={})",
            id, snapshot.yes_votes, snapshot.no_votes
        );
        return Ok(None);
    }

    let mut tx = pool.begin().await?;

    // The claim is the transaction's first statement, so it takes the write
    // lock before anything below is read.
    if !store::claim_modification(&mut *tx, id, now).await? {
        debug!("Modification {} already closed by another resolver", id);
        tx.rollback().await?;
        return Ok(None);
    }

    // Re-read under the lock; a vote may have landed since the snapshot
    let Some(candidate) = store::get_resolution_candidate(&mut *tx, id).await? else {
        tx.rollback().await?;
        return Ok(None);
    };

    let status = match verdict_for(&candidate, config, now) {
        Verdict::Wait => {
            debug!("Modification {} no longer meets a closing condition", id);
            tx.rollback().await?;
            return Ok(None);
        }
        Verdict::Reject => ModificationStatus::FailedVote,
        Verdict::Apply => {
            let mut savepoint = Connection::begin(&mut *tx).await?;
            let status = applier::apply(&mut savepoint, &candidate).await;
            if status == ModificationStatus::Applied {
                savepoint.commit().await?;
            } else {
                savepoint.rollback().await?;
            }
            status
        }
    };

    store::set_status(&mut *tx, id, status).await?;

    match candidate.target_table {
        Some(table) => {
            store::decrement_pending(&mut *tx, table, candidate.target_row_id).await?;
        }
        None => warn!("Modification {} has no known target table - pending count untouched", id),
    }

    reputation::credit(&mut tx, candidate.moderator_id, status).await?;

    tx.commit().await?;

    info!(
        "Modification {} closed as {} (yes={}, no={})",
        id, status, candidate.yes_votes, candidate.no_votes
    );
    Ok(Some(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: i64 = 3;

    #[test]
    fn test_timeout_majority_applies() {
        assert_eq!(decide(3, 1, true, THRESHOLD), Verdict::Apply);
    }

    #[test]
    fn test_timeout_tie_rejects() {
        assert_eq!(decide(2, 2, true, THRESHOLD), Verdict::Reject);
    }

    #[test]
    fn test_timeout_without_votes_rejects() {
        assert_eq!(decide(0, 0, true, THRESHOLD), Verdict::Reject);
    }

    #[test]
    fn test_timeout_minority_rejects() {
        assert_eq!(decide(1, 4, true, THRESHOLD), Verdict::Reject);
    }

    #[test]
    fn test_unanimous_yes_before_timeout() {
        assert_eq!(decide(3, 0, false, THRESHOLD), Verdict::Apply);
    }

    #[test]
    fn test_unanimous_no_before_timeout() {
        assert_eq!(decide(0, 3, false, THRESHOLD), Verdict::Reject);
    }

    #[test]
    fn test_mixed_votes_before_timeout_wait() {
        assert_eq!(decide(3, 1, false, THRESHOLD), Verdict::Wait);
        assert_eq!(decide(1, 3, false, THRESHOLD), Verdict::Wait);
        assert_eq!(decide(2, 0, false, THRESHOLD), Verdict::Wait);
    }

    #[test]
    fn test_unanimity_past_threshold_still_closes() {
        assert_eq!(decide(4, 0, false, THRESHOLD), Verdict::Apply);
        assert_eq!(decide(0, 5, false, THRESHOLD), Verdict::Reject);
    }
}
