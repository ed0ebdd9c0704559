use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::prelude::*;

use rc_core::ports::PendingOperationStorePort;
use rc_core::PendingOperation;

use crate::db::models::PendingOperationRow;
use crate::db::ports::{DbExecutor, InsertMapper, RowMapper};
use crate::db::schema::t_pending_operation::dsl as ops;

/// Queue order is the `position` column, rewritten on every replace.
pub struct DieselPendingOperationRepository<E, M> {
    executor: E,
    mapper: M,
}

impl<E, M> DieselPendingOperationRepository<E, M> {
    pub fn new(executor: E, mapper: M) -> Self {
        Self { executor, mapper }
    }
}

#[async_trait]
impl<E, M> PendingOperationStorePort for DieselPendingOperationRepository<E, M>
where
    E: DbExecutor,
    M: InsertMapper<PendingOperation, PendingOperationRow>
        + RowMapper<PendingOperationRow, PendingOperation>
        + Send
        + Sync,
{
    async fn load_all(&self) -> Result<Vec<PendingOperation>> {
        self.executor.run(|conn| {
            let rows = ops::t_pending_operation
                .order(ops::position.asc())
                .load::<PendingOperationRow>(conn)
                .context("failed to load pending operations")?;

            let mut operations = Vec::with_capacity(rows.len());
            for row in rows {
                let op = self
                    .mapper
                    .to_domain(&row)
                    .with_context(|| format!("Failed to map pending operation {}", row.id))?;
                operations.push(op);
            }
            Ok(operations)
        })
    }

    async fn replace_all(&self, operations: &[PendingOperation]) -> Result<()> {
        let mut rows = Vec::with_capacity(operations.len());
        for (index, op) in operations.iter().enumerate() {
            let mut row = self.mapper.to_row(op)?;
            row.position = index as i64;
            rows.push(row);
        }

        self.executor.run(move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|conn| {
                diesel::delete(ops::t_pending_operation).execute(conn)?;
                for row in &rows {
                    diesel::insert_into(ops::t_pending_operation)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(())
            })
            .context("failed to persist pending operations")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::DieselSqliteExecutor;
    use crate::db::mappers::PendingOperationRowMapper;
    use crate::db::pool::init_db_pool;
    use crate::db::repositories::test_fixtures::record;
    use tempfile::TempDir;

    #[tokio::test]
    async fn replace_all_round_trips_queue_order() {
        let pool = init_db_pool(":memory:").expect("Failed to init db");
        let repo = DieselPendingOperationRepository::new(
            DieselSqliteExecutor::new(pool),
            PendingOperationRowMapper,
        );

        let mut first = PendingOperation::update(record("b", "two", 2_000), 2_000);
        first.attempts = 2;
        first.next_attempt_at = Some(9_000);
        first.last_error = Some("transient failure: timeout".to_string());
        let second = PendingOperation::push(record("a", "one", 1_000), 3_000);

        repo.replace_all(&[first.clone(), second.clone()]).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap(), vec![first.clone(), second.clone()]);

        repo.replace_all(&[second.clone()]).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn queue_survives_reopen() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("queue.db");
        let op = PendingOperation::delete(record("c-1", "bye", 1_000), 1_000);

        {
            let pool = init_db_pool(db_path.to_str().unwrap()).expect("Failed to init db");
            let repo = DieselPendingOperationRepository::new(
                DieselSqliteExecutor::new(pool),
                PendingOperationRowMapper,
            );
            repo.replace_all(std::slice::from_ref(&op)).await.unwrap();
        }

        let pool = init_db_pool(db_path.to_str().unwrap()).expect("Failed to init db");
        let repo = DieselPendingOperationRepository::new(
            DieselSqliteExecutor::new(pool),
            PendingOperationRowMapper,
        );
        assert_eq!(repo.load_all().await.unwrap(), vec![op]);
    }
}
