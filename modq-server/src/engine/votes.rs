//! Vote ledger
//!
//! One vote per moderator per modification. Yes/No votes bump the
//! modification's tallies; abstentions are recorded but not counted.
//! Votes on closed or own modifications, and repeat votes, are ignored.

use chrono::{DateTime, Utc};
use modq_common::db::VoteValue;
use modq_common::{EngineConfig, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::store;
use crate::engine::{resolver, Resolution};

/// One moderator's votes across several modifications
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Ballot {
    pub moderator_id: i64,
    #[serde(default)]
    pub yes: Vec<i64>,
    #[serde(default)]
    pub no: Vec<i64>,
    #[serde(default)]
    pub abstain: Vec<i64>,
}

/// What happened to a ballot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BallotOutcome {
    /// Votes stored
    pub recorded: usize,
    /// Votes dropped (duplicate, own, closed or unknown modification)
    pub ignored: usize,
    /// Modifications this ballot closed early, with their terminal status
    pub resolved: Vec<Resolution>,
}

/// Record a ballot, then check every yes/no modification for early closing
pub async fn cast_votes(
    pool: &SqlitePool,
    config: &EngineConfig,
    ballot: &Ballot,
    now: DateTime<Utc>,
) -> Result<BallotOutcome> {
    let mut outcome = BallotOutcome::default();

    let votes = ballot
        .yes
        .iter()
        .map(|id| (*id, VoteValue::Yes))
        .chain(ballot.no.iter().map(|id| (*id, VoteValue::No)))
        .chain(ballot.abstain.iter().map(|id| (*id, VoteValue::Abstain)));

    for (modification_id, value) in votes {
        if record_vote(pool, ballot.moderator_id, modification_id, value, now).await? {
            outcome.recorded += 1;
        } else {
            debug!(
                "Ignored {} vote by moderator {} on modification {}",
                value, ballot.moderator_id, modification_id
            );
            outcome.ignored += 1;
        }
    }

    let mut touched: Vec<i64> = ballot.yes.iter().chain(ballot.no.iter()).copied().collect();
    touched.sort_unstable();
    touched.dedup();

    for modification_id in touched {
        if let Some(status) = resolver::resolve(pool, config, modification_id, now).await? {
            outcome.resolved.push(Resolution {
                id: modification_id,
                status,
            });
        }
    }

    Ok(outcome)
}

/// Store one vote and its tally change atomically
async fn record_vote(
    pool: &SqlitePool,
    moderator_id: i64,
    modification_id: i64,
    value: VoteValue,
    now: DateTime<Utc>,
) -> Result<bool> {
    let mut tx = pool.begin().await?;

    if !store::insert_vote(&mut *tx, moderator_id, modification_id, value, now).await? {
        tx.rollback().await?;
        return Ok(false);
    }

    store::increment_tally(&mut *tx, modification_id, value).await?;
    tx.commit().await?;

    debug!(
        "Moderator {} voted {} on modification {}",
        moderator_id, value, modification_id
    );
    Ok(true)
}
