//! Filesystem helpers.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("scope.json");
        fs::write(&path, "old").expect("seed");

        write_atomic(&path, b"new").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        assert!(!tmp.path().join("scope.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_missing_parent_fails() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("missing").join("scope.json");
        assert!(write_atomic(&path, b"{}").is_err());
    }
}
