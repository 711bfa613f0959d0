use std::fs;
use std::path::Path;

use anyhow::Context;

pub fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dir: {}", parent.display()))?;
    }
    Ok(())
}

/// Writes `bytes` next to `dst` and swaps the file in, so readers never see a
/// half-written store.
pub fn write_replacing(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    ensure_parent(dst)?;

    let tmp = dst.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("failed to write temp: {}", tmp.display()))?;
    replace_file(&tmp, dst)
}

/// `rename` fails on Windows when the destination exists, so the old file is
/// moved aside first and restored if the swap fails.
pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("nested").join("store.json");

        write_replacing(&dst, b"one").unwrap();
        write_replacing(&dst, b"two").unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"two");
        assert!(!dst.with_extension("tmp").exists());
        assert!(!dst.with_extension("bak").exists());
    }

    #[test]
    fn failed_swap_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("store.json");
        fs::write(&dst, b"kept").unwrap();

        let missing_tmp = dir.path().join("missing.tmp");
        assert!(replace_file(&missing_tmp, &dst).is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"kept");
    }
}
