use async_trait::async_trait;
use diesel::prelude::*;

use rc_core::ids::CanonicalId;
use rc_core::ports::{LocalRecordStorePort, RecordStoreError};
use rc_core::{ClipboardRecord, ContentFingerprint};

use crate::db::models::ClipboardRecordRow;
use crate::db::ports::{DbExecutor, InsertMapper, RowMapper};
use crate::db::schema::t_clipboard_record::dsl as rec;

pub struct DieselClipboardRecordRepository<E, M> {
    executor: E,
    mapper: M,
}

impl<E, M> DieselClipboardRecordRepository<E, M> {
    pub fn new(executor: E, mapper: M) -> Self {
        Self { executor, mapper }
    }
}

impl<E, M> DieselClipboardRecordRepository<E, M>
where
    M: RowMapper<ClipboardRecordRow, ClipboardRecord>,
{
    fn map_rows(&self, rows: Vec<ClipboardRecordRow>) -> anyhow::Result<Vec<ClipboardRecord>> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = self.mapper.to_domain(&row).map_err(|e| {
                anyhow::anyhow!("Failed to map clipboard record {}: {}", row.canonical_id, e)
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl<E, M> LocalRecordStorePort for DieselClipboardRecordRepository<E, M>
where
    E: DbExecutor,
    M: InsertMapper<ClipboardRecord, ClipboardRecordRow>
        + RowMapper<ClipboardRecordRow, ClipboardRecord>
        + Send
        + Sync,
{
    async fn get_by_id(
        &self,
        id: &CanonicalId,
    ) -> Result<Option<ClipboardRecord>, RecordStoreError> {
        let id_str = id.as_str().to_string();
        self.executor
            .run(move |conn| {
                let row = rec::t_clipboard_record
                    .filter(rec::canonical_id.eq(&id_str))
                    .first::<ClipboardRecordRow>(conn)
                    .optional()?;

                match row {
                    Some(r) => Ok(Some(self.mapper.to_domain(&r)?)),
                    None => Ok(None),
                }
            })
            .map_err(|e| RecordStoreError::Storage(e.to_string()))
    }

    async fn upsert(&self, record: &ClipboardRecord) -> Result<(), RecordStoreError> {
        let row = self
            .mapper
            .to_row(record)
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        self.executor
            .run(move |conn| {
                diesel::replace_into(rec::t_clipboard_record)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
            .map_err(|e| RecordStoreError::Storage(e.to_string()))
    }

    async fn delete(&self, id: &CanonicalId) -> Result<(), RecordStoreError> {
        let id_str = id.as_str().to_string();
        let affected = self
            .executor
            .run(move |conn| {
                let affected = diesel::delete(
                    rec::t_clipboard_record.filter(rec::canonical_id.eq(&id_str)),
                )
                .execute(conn)?;
                Ok(affected)
            })
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(RecordStoreError::NotFound);
        }
        Ok(())
    }

    async fn query_modified_since(
        &self,
        since_ms: i64,
    ) -> Result<Vec<ClipboardRecord>, RecordStoreError> {
        self.executor
            .run(move |conn| {
                let rows = rec::t_clipboard_record
                    .filter(rec::last_modified.ge(since_ms))
                    .order((rec::last_modified.asc(), rec::canonical_id.asc()))
                    .load::<ClipboardRecordRow>(conn)?;
                self.map_rows(rows)
            })
            .map_err(|e| RecordStoreError::Storage(e.to_string()))
    }

    async fn find_live_by_fingerprint(
        &self,
        fp: &ContentFingerprint,
    ) -> Result<Vec<ClipboardRecord>, RecordStoreError> {
        let fp_str = fp.to_string();
        self.executor
            .run(move |conn| {
                let rows = rec::t_clipboard_record
                    .filter(rec::fingerprint.eq(&fp_str))
                    .filter(rec::deleted.eq(false))
                    .order(rec::last_modified.desc())
                    .load::<ClipboardRecordRow>(conn)?;
                self.map_rows(rows)
            })
            .map_err(|e| RecordStoreError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::DieselSqliteExecutor;
    use crate::db::mappers::ClipboardRecordRowMapper;
    use crate::db::pool::init_db_pool;
    use crate::db::repositories::test_fixtures::record;
    use rc_core::{DeviceRole, SyncState};

    fn repo() -> DieselClipboardRecordRepository<DieselSqliteExecutor, ClipboardRecordRowMapper> {
        let pool = init_db_pool(":memory:").expect("Failed to init db");
        DieselClipboardRecordRepository::new(
            DieselSqliteExecutor::new(pool),
            ClipboardRecordRowMapper,
        )
    }

    #[tokio::test]
    async fn upsert_then_get_preserves_every_field() {
        let repo = repo();
        let mut r = record("c-1", "hello", 1_000);
        r.relayed_by = Some("relay-1".into());
        r.sync_state = SyncState::Synced;
        r.last_synced_at = Some(1_500);

        repo.upsert(&r).await.unwrap();

        let loaded = repo.get_by_id(&r.canonical_id).await.unwrap();
        assert_eq!(loaded, Some(r));
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_row() {
        let repo = repo();
        let mut r = record("c-1", "hello", 1_000);
        repo.upsert(&r).await.unwrap();

        r.tombstone(DeviceRole::Client, 2_000);
        repo.upsert(&r).await.unwrap();

        let loaded = repo.get_by_id(&r.canonical_id).await.unwrap().unwrap();
        assert!(loaded.deleted);
        assert_eq!(loaded.deleted_at, Some(2_000));
        assert_eq!(loaded.modified_by_role, DeviceRole::Client);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = repo();
        assert_eq!(repo.get_by_id(&"nope".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let repo = repo();
        let r = record("c-1", "hello", 1_000);
        repo.upsert(&r).await.unwrap();

        repo.delete(&r.canonical_id).await.unwrap();
        assert_eq!(
            repo.delete(&r.canonical_id).await,
            Err(RecordStoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn query_modified_since_includes_tombstones_and_boundary() {
        let repo = repo();
        repo.upsert(&record("old", "a", 1_000)).await.unwrap();
        repo.upsert(&record("edge", "b", 2_000)).await.unwrap();
        let mut gone = record("gone", "c", 2_500);
        gone.tombstone(DeviceRole::Relay, 3_000);
        repo.upsert(&gone).await.unwrap();

        let ids: Vec<String> = repo
            .query_modified_since(2_000)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.canonical_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["edge".to_string(), "gone".to_string()]);
    }

    #[tokio::test]
    async fn find_live_by_fingerprint_skips_tombstones() {
        let repo = repo();
        let live = record("live", "same", 1_000);
        let mut dead = record("dead", "same", 1_100);
        dead.tombstone(DeviceRole::Relay, 1_200);
        repo.upsert(&live).await.unwrap();
        repo.upsert(&dead).await.unwrap();
        repo.upsert(&record("other", "different", 1_300)).await.unwrap();

        let found = repo.find_live_by_fingerprint(&live.fingerprint).await.unwrap();
        assert_eq!(found, vec![live]);
    }
}
