use crate::db::schema::t_clipboard_record;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = t_clipboard_record)]
pub struct ClipboardRecordRow {
    pub canonical_id: String,
    pub content_type: String,
    pub content_json: String,
    pub fingerprint: String,
    pub created_at: i64,
    pub last_modified: i64,
    pub origin_device: String,
    pub relayed_by: Option<String>,
    pub modified_by_role: String,
    pub sync_state: String,
    pub last_synced_at: Option<i64>,
    pub deleted: bool,
    pub deleted_at: Option<i64>,
}
