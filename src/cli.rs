use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "emotion-tts",
    version,
    about = "Emotion tagging and emotion-conditioned GPT-SoVITS synthesis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: ./config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag a `path|speaker|language|text` list file with emotions.
    Tag {
        #[arg(value_name = "LIST_FILE")]
        list_file: PathBuf,
    },
    /// Interactive synthesis from an annotation JSON file.
    Infer {
        #[arg(value_name = "ANNOTATIONS_JSON")]
        annotations: PathBuf,
    },
}
