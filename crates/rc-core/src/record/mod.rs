//! Clipboard record domain model.

mod content;
mod clipboard_record;
mod sync_state;

pub use content::{ClipboardContent, ContentType};
pub use clipboard_record::ClipboardRecord;
pub use sync_state::SyncState;
