//! JSON export of a compiled digest for API consumers.
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06.json
//! ```

use crate::error::{DigestError, Result};
use crate::models::Digest;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `digest` to `{json_output_dir}/{date}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.as_ref().display()))]
pub async fn write_digest_json(digest: &Digest, json_output_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let json_output_dir = json_output_dir.as_ref();
    let json = serde_json::to_string_pretty(digest)
        .map_err(|e| DigestError::Parse(format!("cannot serialize digest: {e}")))?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = json_output_dir.join(format!("{}.json", digest.date));
    fs::write(&path, json).await?;
    info!(path = %path.display(), stories = digest.stories.len(), "Wrote JSON digest");
    Ok(path)
}
