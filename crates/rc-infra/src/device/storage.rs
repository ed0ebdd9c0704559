//! File I/O for the persisted device ID.

use anyhow::{Context, Result};
use std::path::Path;

use rc_core::ids::DeviceId;

const DEVICE_ID_FILE: &str = "device_id.txt";

/// `None` when the file is missing or empty.
pub(crate) fn load_from_disk(data_dir: &Path) -> Result<Option<DeviceId>> {
    let path = data_dir.join(DEVICE_ID_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("read device_id file failed: {}", path.display()))?;

    let id_str = content.trim();
    if id_str.is_empty() {
        return Ok(None);
    }

    uuid::Uuid::parse_str(id_str)
        .with_context(|| format!("invalid device_id UUID in file: {}", path.display()))?;

    Ok(Some(DeviceId::new(id_str)))
}

/// Write via temp file + rename, falling back to a direct write when rename
/// is not possible (cross-device temp dirs).
pub(crate) fn save_to_disk(data_dir: &Path, id: &DeviceId) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir failed: {}", data_dir.display()))?;

    let path = data_dir.join(DEVICE_ID_FILE);
    let tmp_path = path.with_extension("txt.tmp");
    std::fs::write(&tmp_path, id.as_str())
        .with_context(|| format!("write temp device_id failed: {}", tmp_path.display()))?;

    if let Err(rename_err) = std::fs::rename(&tmp_path, &path) {
        std::fs::write(&path, id.as_str()).with_context(|| {
            format!(
                "direct write device_id failed after rename error ({}): {}",
                rename_err,
                path.display()
            )
        })?;
        let _ = std::fs::remove_file(&tmp_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from_disk(&dir.path().join("absent")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn rejects_garbage_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEVICE_ID_FILE), "not-a-uuid").unwrap();
        assert!(load_from_disk(dir.path()).is_err());
    }

    #[test]
    fn blank_file_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEVICE_ID_FILE), "  \n").unwrap();
        assert!(load_from_disk(dir.path()).unwrap().is_none());
    }

    #[test]
    fn save_then_load_roundtrips_and_cleans_temp() {
        let dir = tempfile::tempdir().unwrap();
        let id = DeviceId::new(uuid::Uuid::new_v4().to_string());

        save_to_disk(dir.path(), &id).unwrap();

        assert_eq!(load_from_disk(dir.path()).unwrap(), Some(id));
        assert!(!dir.path().join("device_id.txt.tmp").exists());
    }
}
