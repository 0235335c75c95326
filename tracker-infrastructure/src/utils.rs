use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDateTime};
use tokio::fs;

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Now plus a day of slack for hosts logging in another timezone.
pub fn latest_plausible_line_at() -> NaiveDateTime {
    Local::now().naive_local() + Duration::days(1)
}

pub fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

/// Writes through a sibling temp file and renames it over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
