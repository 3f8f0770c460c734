// src/core/fs_ops.rs
//! File system operations shared by the pipeline stages

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info};

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    /// Write `content`, creating parent directories as needed.
    pub async fn write_file_safe(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        info!("Written file: {}", path.display());
        Ok(())
    }

    pub fn normalize_path(base: &Path, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            base.join(relative)
        }
    }

    /// Files in `dir` with extension `ext`, sorted by name.
    pub async fn list_files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if !dir.exists() {
            return Ok(files);
        }

        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if path.is_file() && matches_ext {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Files named `<prefix>*.<ext>` in `dir`, newest modification time first.
    pub async fn files_by_mtime(dir: &Path, prefix: &str, ext: &str) -> Result<Vec<PathBuf>> {
        let mut stamped: Vec<(SystemTime, PathBuf)> = Vec::new();

        for path in Self::list_files_with_extension(dir, ext).await? {
            let named = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            if !named {
                continue;
            }

            let modified = fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            stamped.push((modified, path));
        }

        // Name breaks ties: artifact names carry a sortable timestamp.
        stamped.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        debug!("Found {} '{}' file(s) in {}", stamped.len(), prefix, dir.display());

        Ok(stamped.into_iter().map(|(_, path)| path).collect())
    }

    /// Most recently modified `<prefix>*.<ext>` file in `dir`.
    pub async fn latest_file(dir: &Path, prefix: &str, ext: &str) -> Result<Option<PathBuf>> {
        Ok(Self::files_by_mtime(dir, prefix, ext).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            FsOps::normalize_path(Path::new("/base"), Path::new("data")),
            PathBuf::from("/base/data")
        );
        assert_eq!(
            FsOps::normalize_path(Path::new("/base"), Path::new("/abs")),
            PathBuf::from("/abs")
        );
    }

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/file.txt");

        FsOps::write_file_safe(&path, b"hello").await.unwrap();
        assert_eq!(FsOps::read_file_safe(&path).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_list_files_filters_extension() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.html", "a.HTML", "notes.txt"] {
            std::fs::write(tmp.path().join(name), "x").unwrap();
        }

        let files = FsOps::list_files_with_extension(tmp.path(), "html")
            .await
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.HTML", "b.html"]);
    }

    #[tokio::test]
    async fn test_latest_file_picks_newest_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let older = tmp.path().join("extracted_jobs_b.json");
        let newer = tmp.path().join("extracted_jobs_a.json");
        std::fs::write(&older, "[]").unwrap();
        std::fs::write(&newer, "[]").unwrap();
        std::fs::write(tmp.path().join("other.json"), "[]").unwrap();

        let past = SystemTime::now() - std::time::Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let latest = FsOps::latest_file(tmp.path(), "extracted_jobs_", "json")
            .await
            .unwrap();
        assert_eq!(latest, Some(newer));
    }

    #[tokio::test]
    async fn test_latest_file_missing_dir() {
        let latest = FsOps::latest_file(Path::new("/nonexistent/dir"), "x", "json")
            .await
            .unwrap();
        assert_eq!(latest, None);
    }
}
