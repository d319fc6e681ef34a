pub mod cli;
pub mod config;
pub mod emotion;
pub mod llm;
pub mod pipeline;
pub mod synth;
pub mod tagger;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands};
use config::{AppConfig, AppPaths};
use llm::{ApiClient, EmotionInferer, LlmClient};
use pipeline::InteractiveSession;
use synth::{ApiTtsClient, Synthesizer};

pub async fn run(cli: Cli) -> Result<()> {
    let paths = match &cli.config {
        Some(path) => AppPaths::with_config(path.clone(), Path::new(".")),
        None => AppPaths::new(),
    };
    let config = AppConfig::load_from(&paths.config_file).context("load config")?;
    init_logging(&config, cli.verbose);
    log::debug!("config file: {}", paths.config_file.display());

    match cli.command {
        Commands::Tag { list_file } => tag(&config, &paths, &list_file).await,
        Commands::Infer { annotations } => infer(&config, &paths, &annotations).await,
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn tag(config: &AppConfig, paths: &AppPaths, list_file: &Path) -> Result<()> {
    let llm: Arc<dyn LlmClient> = Arc::new(ApiClient::from_config(&config.llm)?);
    let summary = pipeline::run_tagging(config, paths, list_file, llm).await?;
    println!(
        "Emotion annotations have been written to {} ({} entries)",
        summary.output.display(),
        summary.written
    );
    Ok(())
}

async fn infer(config: &AppConfig, paths: &AppPaths, annotations: &Path) -> Result<()> {
    let store = pipeline::load_store(annotations)?;
    let vocab = config.vocabulary();

    let tts = Arc::new(ApiTtsClient::from_config(&config.inference)?);
    let synth = Synthesizer::new(store, tts, config.inference.clone());

    let llm: Arc<dyn LlmClient> = Arc::new(ApiClient::from_config(&config.llm)?);
    let inferer = EmotionInferer::new(llm, vocab.clone());

    let session = InteractiveSession::new(synth, inferer, vocab, paths.audios_dir.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let written = session.run(stdin, tokio::io::stdout()).await?;
    log::info!("session ended; {} clip(s) written", written.len());
    Ok(())
}
