use anyhow::Result;

use rc_core::ids::CanonicalId;
use rc_core::CanonicalAlias;

use crate::db::models::CanonicalAliasRow;
use crate::db::ports::{InsertMapper, RowMapper};

pub struct CanonicalAliasRowMapper;

impl InsertMapper<CanonicalAlias, CanonicalAliasRow> for CanonicalAliasRowMapper {
    fn to_row(&self, domain: &CanonicalAlias) -> Result<CanonicalAliasRow> {
        Ok(CanonicalAliasRow {
            alias_id: domain.alias_id.as_str().to_string(),
            surviving_id: domain.surviving_id.as_str().to_string(),
            created_at: domain.created_at,
        })
    }
}

impl RowMapper<CanonicalAliasRow, CanonicalAlias> for CanonicalAliasRowMapper {
    fn to_domain(&self, row: &CanonicalAliasRow) -> Result<CanonicalAlias> {
        Ok(CanonicalAlias {
            alias_id: CanonicalId::from(row.alias_id.as_str()),
            surviving_id: CanonicalId::from(row.surviving_id.as_str()),
            created_at: row.created_at,
        })
    }
}
