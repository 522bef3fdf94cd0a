//! Command-line interface.
//!
//! Secrets are read from the environment (or a `.env` file) so they never
//! have to appear on the command line.

use clap::Parser;

/// Gather, summarize and fact-check today's AI news into a Markdown digest.
///
/// ```sh
/// ai_daily_digest --config config.yaml --output-dir ./digests
/// ai_daily_digest -q "AI chip breakthrough" --json-output-dir ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the digest configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Directory the Markdown digest is written to
    #[arg(short, long, default_value = "digests")]
    pub output_dir: String,

    /// Optional directory for a JSON copy of the digest
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Search query; overrides `search.query` from the configuration
    #[arg(short, long)]
    pub query: Option<String>,

    /// Serper.dev API key
    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true)]
    pub serper_api_key: Option<String>,

    /// Path to the awful_aj config.yaml (defaults to the awful_aj config directory)
    #[arg(long)]
    pub aj_config: Option<String>,
}
