//! Compile and persist the digest.
//!
//! - [`markdown`]: renders verified summaries into the Markdown digest
//! - [`digest`]: writes `ai_digest_{date}.md` without partial writes
//! - [`json`]: optional JSON export of the same run
//!
//! ```text
//! digests/
//! └── ai_digest_2025-05-06.md
//!
//! json_output_dir/
//! └── 2025-05-06.json
//! ```

pub mod digest;
pub mod json;
pub mod markdown;
