//! Atomic write primitives
//!
//! Uses temp→rename pattern to ensure no partial writes

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::errors::{io_error, Result};

fn temp_path_for(target_path: &Path) -> PathBuf {
    let name = target_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    target_path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// Atomically write bytes to a file
///
/// Writes a sibling temp file and renames it over the target, so readers
/// see either the old or the new content.
pub async fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error("create_config_dir", e))?;
    }

    let temp_path = temp_path_for(target_path);
    fs::write(&temp_path, content)
        .await
        .map_err(|e| io_error("write_config_temp", e))?;

    if let Err(e) = fs::rename(&temp_path, target_path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_error("rename_config_temp", e));
    }
    Ok(())
}
