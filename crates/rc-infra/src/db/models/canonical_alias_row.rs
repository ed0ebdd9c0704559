use crate::db::schema::t_canonical_alias;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = t_canonical_alias)]
pub struct CanonicalAliasRow {
    pub alias_id: String,
    pub surviving_id: String,
    pub created_at: i64,
}
