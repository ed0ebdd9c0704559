mod canonical_alias_mapper;
mod clipboard_record_mapper;
mod pending_operation_mapper;

pub use canonical_alias_mapper::CanonicalAliasRowMapper;
pub use clipboard_record_mapper::ClipboardRecordRowMapper;
pub use pending_operation_mapper::PendingOperationRowMapper;
