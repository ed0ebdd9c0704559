use crate::db::schema::t_pending_operation;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = t_pending_operation)]
pub struct PendingOperationRow {
    pub id: String,
    /// Queue order; rewritten on every replace-all.
    pub position: i64,
    pub op_type: String,
    pub target: Option<String>,
    pub payload_json: String,
    pub enqueued_at: i64,
    pub attempts: i32,
    pub next_attempt_at: Option<i64>,
    pub last_error: Option<String>,
}
