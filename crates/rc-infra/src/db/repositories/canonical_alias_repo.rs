use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::prelude::*;

use rc_core::ids::CanonicalId;
use rc_core::ports::CanonicalAliasPort;
use rc_core::CanonicalAlias;

use crate::db::models::CanonicalAliasRow;
use crate::db::ports::{DbExecutor, InsertMapper, RowMapper};
use crate::db::schema::t_canonical_alias::dsl as alias;

pub struct DieselCanonicalAliasRepository<E, M> {
    executor: E,
    mapper: M,
}

impl<E, M> DieselCanonicalAliasRepository<E, M> {
    pub fn new(executor: E, mapper: M) -> Self {
        Self { executor, mapper }
    }
}

#[async_trait]
impl<E, M> CanonicalAliasPort for DieselCanonicalAliasRepository<E, M>
where
    E: DbExecutor,
    M: InsertMapper<CanonicalAlias, CanonicalAliasRow>
        + RowMapper<CanonicalAliasRow, CanonicalAlias>
        + Send
        + Sync,
{
    async fn record_alias(&self, value: &CanonicalAlias) -> Result<()> {
        let row = self.mapper.to_row(value)?;
        self.executor.run(move |conn| {
            diesel::replace_into(alias::t_canonical_alias)
                .values(&row)
                .execute(conn)
                .context("failed to record canonical alias")?;
            Ok(())
        })
    }

    async fn find_survivor(&self, id: &CanonicalId) -> Result<Option<CanonicalId>> {
        let id_str = id.as_str().to_string();
        self.executor.run(move |conn| {
            let survivor = alias::t_canonical_alias
                .filter(alias::alias_id.eq(&id_str))
                .select(alias::surviving_id)
                .first::<String>(conn)
                .optional()?;
            Ok(survivor.map(CanonicalId::from))
        })
    }

    async fn list_aliases(&self) -> Result<Vec<CanonicalAlias>> {
        self.executor.run(|conn| {
            let rows = alias::t_canonical_alias
                .order(alias::created_at.asc())
                .load::<CanonicalAliasRow>(conn)?;
            rows.iter().map(|row| self.mapper.to_domain(row)).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::DieselSqliteExecutor;
    use crate::db::mappers::CanonicalAliasRowMapper;
    use crate::db::pool::init_db_pool;

    #[tokio::test]
    async fn records_and_follows_aliases() {
        let pool = init_db_pool(":memory:").expect("Failed to init db");
        let repo = DieselCanonicalAliasRepository::new(
            DieselSqliteExecutor::new(pool),
            CanonicalAliasRowMapper,
        );

        let entry = CanonicalAlias {
            alias_id: CanonicalId::from("loser"),
            surviving_id: CanonicalId::from("winner"),
            created_at: 5_000,
        };
        repo.record_alias(&entry).await.unwrap();
        // Re-recording the same alias is a no-op rather than a constraint error.
        repo.record_alias(&entry).await.unwrap();

        assert_eq!(
            repo.find_survivor(&"loser".into()).await.unwrap(),
            Some(CanonicalId::from("winner"))
        );
        assert_eq!(repo.find_survivor(&"winner".into()).await.unwrap(), None);
        assert_eq!(repo.list_aliases().await.unwrap(), vec![entry]);
    }
}
