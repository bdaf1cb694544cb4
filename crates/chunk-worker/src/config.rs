//! Worker configuration from command-line arguments and environment variables

use std::env;
use std::path::PathBuf;

use game_chunker::ChunkerConfig;
use tracing::info;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// PGN files, directories or glob patterns to chunk
    pub inputs: Vec<String>,

    /// JSON lines destination (stdout when unset)
    pub output: Option<PathBuf>,

    /// HuggingFace tokenizer.json matching the embedding model
    pub tokenizer_path: Option<PathBuf>,

    /// Games chunked concurrently
    pub workers: usize,

    pub chunker: ChunkerConfig,
}

impl WorkerConfig {
    /// Load configuration from `args` (program name excluded) and the environment.
    /// `--out` overrides `CHUNK_OUTPUT`.
    pub fn load(args: &[String]) -> Result<Self, WorkerError> {
        let (inputs, out_flag) = parse_args(args)?;

        let output = out_flag.or_else(|| env::var("CHUNK_OUTPUT").ok().map(PathBuf::from));

        let tokenizer_path = env::var("TOKENIZER_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let workers = env::var("CHUNK_WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or_else(num_cpus::get);

        let chunker = ChunkerConfig::from_env()?;
        info!(
            max_tokens = chunker.max_chunk_tokens,
            min_tokens = chunker.min_chunk_tokens,
            eval_retention = ?chunker.eval_retention,
            branch_descent = ?chunker.branch_descent,
            "Chunker config loaded"
        );

        Ok(Self {
            inputs,
            output,
            tokenizer_path,
            workers,
            chunker,
        })
    }
}

/// Split arguments into input patterns and the optional `--out` path.
fn parse_args(args: &[String]) -> Result<(Vec<String>, Option<PathBuf>), WorkerError> {
    let mut inputs = Vec::new();
    let mut output = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--out" {
            let path = iter
                .next()
                .ok_or(WorkerError::Config("--out requires a path"))?;
            output = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--out=") {
            output = Some(PathBuf::from(path));
        } else {
            inputs.push(arg.clone());
        }
    }
    if inputs.is_empty() {
        return Err(WorkerError::Config(
            "usage: chunk-worker <pgn file|dir|glob>... [--out FILE]",
        ));
    }
    Ok((inputs, output))
}
