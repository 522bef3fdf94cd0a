//! Digest file persistence.
//!
//! The digest is written to a temporary sibling file and renamed into place,
//! so readers never observe a half-written `ai_digest_{date}.md`.

use crate::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub fn digest_filename(date: NaiveDate) -> String {
    format!("ai_digest_{}.md", date.format("%Y-%m-%d"))
}

/// Write `markdown` as the digest for `date` under `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.as_ref().display(), %date))]
pub async fn write_digest(
    output_dir: impl AsRef<Path>,
    date: NaiveDate,
    markdown: &str,
) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).await?;

    let path = output_dir.join(digest_filename(date));
    let tmp_path = output_dir.join(format!(".{}.tmp", digest_filename(date)));

    if let Err(e) = fs::write(&tmp_path, markdown).await {
        error!(path = %tmp_path.display(), error = %e, "Failed writing digest");
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    fs::rename(&tmp_path, &path).await?;

    info!(path = %path.display(), bytes = markdown.len(), "Wrote digest");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    #[test]
    fn test_digest_filename() {
        assert_eq!(digest_filename(date()), "ai_digest_2025-05-06.md");
    }

    #[tokio::test]
    async fn test_write_digest_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("digests");

        let path = write_digest(&dir, date(), "# AI News Digest").await.unwrap();
        assert_eq!(path, dir.join("ai_digest_2025-05-06.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# AI News Digest");
        assert!(!dir.join(".ai_digest_2025-05-06.md.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_digest_replaces_same_day() {
        let tmp = tempfile::tempdir().unwrap();
        write_digest(tmp.path(), date(), "first").await.unwrap();
        let path = write_digest(tmp.path(), date(), "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }
}
