use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;
use tracing::info;

/// Write the untouched vCard text to `out_dir/<file_name>`.
///
/// `file_name` must be a single plain path component; anything that could
/// resolve outside `out_dir` is refused.
pub fn save(raw: &str, file_name: &str, out_dir: &Path) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => bail!("refusing to save contact under unsafe file name {file_name:?}"),
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.display()))?;
    let target = out_dir.join(file_name);
    write_atomic(&target, raw.as_bytes())?;
    info!(path = %target.display(), "saved contact");
    Ok(target)
}

/// Stage `data` in a temporary file next to `target`, then move it into
/// place. The temporary file is removed if any step before the move fails.
fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage contact in {}", dir.display()))?;
    staged
        .write_all(data)
        .and_then(|()| staged.as_file().sync_all())
        .with_context(|| format!("failed to write staged file {}", staged.path().display()))?;
    staged
        .persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to move contact into {}", target.display()))?;
    Ok(())
}
