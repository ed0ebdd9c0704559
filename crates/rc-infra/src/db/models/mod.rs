mod canonical_alias_row;
mod clipboard_record_row;
mod pending_operation_row;

pub use canonical_alias_row::CanonicalAliasRow;
pub use clipboard_record_row::ClipboardRecordRow;
pub use pending_operation_row::PendingOperationRow;
