//! Batch chunker
//!
//! Reads PGN files, splits every game into token-bounded chunks and writes them
//! as JSON lines for the embedding pipeline.

mod config;
mod error;
mod output;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chess_core::read_games;
use game_chunker::{assemble, HeuristicCounter, HfTokenCounter, TokenCounter};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::output::ChunkSink;

/// Expand files, directories (`**/*.pgn`) and glob patterns into a sorted file list.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, WorkerError> {
    let mut files = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        let pattern = if path.is_dir() {
            format!("{}/**/*.pgn", input.trim_end_matches('/'))
        } else if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        } else {
            input.clone()
        };

        let entries = glob::glob(&pattern).map_err(|e| WorkerError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        let before = files.len();
        for entry in entries {
            match entry {
                Ok(file) if file.is_file() => files.push(file),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Unreadable path skipped"),
            }
        }
        if files.len() == before {
            warn!(input = %input, "No PGN files matched");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn token_counter(config: &WorkerConfig) -> Result<Arc<dyn TokenCounter>, WorkerError> {
    match &config.tokenizer_path {
        Some(path) => {
            let counter = HfTokenCounter::from_file(path)?;
            info!(tokenizer = %path.display(), "Tokenizer loaded");
            Ok(Arc::new(counter))
        }
        None => {
            warn!("TOKENIZER_PATH not set, estimating tokens from character count");
            Ok(Arc::new(HeuristicCounter))
        }
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, WorkerError> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = WorkerConfig::load(&args)?;
    let files = expand_inputs(&config.inputs)?;
    info!(files = files.len(), workers = config.workers, "Worker config loaded");

    let counter = token_counter(&config)?;
    let chunker = Arc::new(config.chunker.clone());
    let semaphore = Arc::new(Semaphore::new(config.workers));

    let out = open_output(config.output.as_deref())?;
    let mut sink = ChunkSink::new(out, config.workers * 2);

    for file in &files {
        let source_file = file.display().to_string();
        let games = match File::open(file).and_then(|f| read_games(BufReader::new(f))) {
            Ok(games) => games,
            Err(e) => {
                error!(file = %source_file, error = %e, "Failed to read PGN file");
                sink.skip();
                continue;
            }
        };
        info!(file = %source_file, games = games.len(), "Read PGN file");

        for (index, parsed) in games.into_iter().enumerate() {
            let game_number = index as u32 + 1;
            let game_ref = format!("{source_file}#{game_number}");
            let tree = match parsed {
                Ok(tree) => tree,
                Err(e) => {
                    warn!(game = %game_ref, error = %e, "Skipping malformed game");
                    sink.skip();
                    continue;
                }
            };

            let permit = semaphore.clone().acquire_owned().await?;
            let counter = counter.clone();
            let chunker = chunker.clone();
            let source_file = source_file.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit; // Hold until done
                assemble(&tree, &source_file, game_number, &chunker, counter.as_ref())
            });
            sink.push(game_ref, handle).await?;
        }
    }
    sink.finish().await?;

    info!(
        games = sink.games,
        chunks = sink.written,
        failed = sink.failed,
        "Chunking complete"
    );
    Ok(())
}
