//! Periodic resolution of expired modifications

use chrono::{DateTime, Utc};
use modq_common::db::ModificationStatus;
use modq_common::time::sub_saturating;
use modq_common::{EngineConfig, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::db::store;
use crate::engine::resolver;

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired open modifications found
    pub examined: usize,
    pub applied: usize,
    pub failed_vote: usize,
    pub failed_dependency: usize,
    pub errored: usize,
}

impl SweepReport {
    fn record(&mut self, status: ModificationStatus) {
        match status {
            ModificationStatus::Applied => self.applied += 1,
            ModificationStatus::FailedVote => self.failed_vote += 1,
            ModificationStatus::FailedDependency => self.failed_dependency += 1,
            ModificationStatus::Error => self.errored += 1,
            ModificationStatus::Open => {}
        }
    }

    pub fn closed(&self) -> usize {
        self.applied + self.failed_vote + self.failed_dependency + self.errored
    }
}

/// Resolve every open modification whose voting period has elapsed at `now`
pub async fn sweep_expired(
    pool: &SqlitePool,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let cutoff = sub_saturating(now, config.voting_period);
    let ids = store::open_ids_submitted_before(pool, cutoff).await?;

    let mut report = SweepReport {
        examined: ids.len(),
        ..SweepReport::default()
    };

    for id in ids {
        if let Some(status) = resolver::resolve(pool, config, id, now).await? {
            report.record(status);
        }
    }

    if report.examined > 0 {
        info!(
            "Sweep closed {} of {} expired modifications ({} applied, {} failed vote, {} failed dependency, {} error)",
            report.closed(),
            report.examined,
            report.applied,
            report.failed_vote,
            report.failed_dependency,
            report.errored
        );
    } else {
        debug!("Sweep found no expired modifications");
    }

    Ok(report)
}

/// Run [`sweep_expired`] every `sweep_interval` until `shutdown` flips to true
///
/// A failed sweep is logged and retried on the next tick.
pub fn spawn_sweeper(
    pool: SqlitePool,
    config: EngineConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            "Sweeper started (interval {:?}, voting period {:?})",
            config.sweep_interval, config.voting_period
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = sweep_expired(&pool, &config, modq_common::time::now()).await {
                        error!("Sweep failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sweeper stopped");
    })
}
