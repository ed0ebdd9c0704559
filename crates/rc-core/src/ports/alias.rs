use anyhow::Result;
use async_trait::async_trait;

use crate::canonical::CanonicalAlias;
use crate::ids::CanonicalId;

/// Durable alias table mapping retired canonical IDs to their survivors.
#[async_trait]
pub trait CanonicalAliasPort: Send + Sync {
    async fn record_alias(&self, alias: &CanonicalAlias) -> Result<()>;

    /// Direct survivor of `id`, if `id` was retired.
    async fn find_survivor(&self, id: &CanonicalId) -> Result<Option<CanonicalId>>;

    async fn list_aliases(&self) -> Result<Vec<CanonicalAlias>>;
}
