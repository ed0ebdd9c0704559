mod canonical_alias_repo;
mod clipboard_record_repo;
mod pending_operation_repo;

pub use canonical_alias_repo::*;
pub use clipboard_record_repo::*;
pub use pending_operation_repo::*;
