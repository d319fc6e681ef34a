//! Application entry point.
//!
//! 1. Parse the command line.
//! 2. Load [`AppConfig`](emotion_tts::config::AppConfig) (defaults on first run).
//! 3. Initialise logging from `log_level`, `RUST_LOG` or `-v`.
//! 4. Run `tag` or `infer`.

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = emotion_tts::cli::Cli::parse();
    emotion_tts::run(cli).await
}
