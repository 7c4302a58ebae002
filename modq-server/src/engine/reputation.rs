//! Moderator reputation counters
//!
//! Bumped once per modification, by the resolver, in the same transaction
//! that closes it.

use modq_common::db::ModificationStatus;
use modq_common::Result;
use sqlx::SqliteConnection;
use tracing::debug;

/// Credit the submitting moderator for a terminal outcome
///
/// Applied counts as accepted, every other terminal status as rejected.
/// Open is never credited.
pub async fn credit(
    conn: &mut SqliteConnection,
    moderator_id: i64,
    status: ModificationStatus,
) -> Result<()> {
    let sql = match status {
        ModificationStatus::Open => {
            debug!("Not crediting moderator {} for an open modification", moderator_id);
            return Ok(());
        }
        ModificationStatus::Applied => {
            "UPDATE moderators SET accepted_count = accepted_count + 1 WHERE id = ?"
        }
        ModificationStatus::FailedVote
        | ModificationStatus::FailedDependency
        | ModificationStatus::Error => {
            "UPDATE moderators SET rejected_count = rejected_count + 1 WHERE id = ?"
        }
    };

    sqlx::query(sql).bind(moderator_id).execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{create_moderator, get_moderator};
    use modq_common::db::open_in_memory;

    #[tokio::test]
    async fn test_credit_by_outcome() {
        let pool = open_in_memory().await.unwrap();
        let id = create_moderator(&pool, "carol").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        credit(&mut conn, id, ModificationStatus::Applied).await.unwrap();
        credit(&mut conn, id, ModificationStatus::FailedVote).await.unwrap();
        credit(&mut conn, id, ModificationStatus::FailedDependency).await.unwrap();
        credit(&mut conn, id, ModificationStatus::Error).await.unwrap();
        credit(&mut conn, id, ModificationStatus::Open).await.unwrap();
        drop(conn);

        let account = get_moderator(&pool, id).await.unwrap().unwrap();
        assert_eq!(account.accepted_count, 1);
        assert_eq!(account.rejected_count, 3);
    }
}
