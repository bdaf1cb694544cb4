//! Ordered JSON-lines output
//!
//! Games are chunked concurrently but written in input order. Finished games at the
//! front of the queue are written as soon as they are ready, and the queue never
//! holds more than `window` games.

use std::collections::VecDeque;
use std::io::Write;

use game_chunker::{Chunk, ChunkError};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::WorkerError;

pub type ChunkTask = JoinHandle<Result<Vec<Chunk>, ChunkError>>;

pub struct ChunkSink<W: Write> {
    out: W,
    pending: VecDeque<(String, ChunkTask)>,
    window: usize,
    pub games: usize,
    pub written: usize,
    pub failed: usize,
}

impl<W: Write> ChunkSink<W> {
    pub fn new(out: W, window: usize) -> Self {
        Self {
            out,
            pending: VecDeque::new(),
            window: window.max(1),
            games: 0,
            written: 0,
            failed: 0,
        }
    }

    /// Count a game that never reached the chunker.
    pub fn skip(&mut self) {
        self.failed += 1;
    }

    /// Queue a game, then write every game that is ready at the front.
    pub async fn push(&mut self, game_ref: String, task: ChunkTask) -> Result<(), WorkerError> {
        self.pending.push_back((game_ref, task));
        loop {
            let ready = match self.pending.front() {
                Some((_, front)) => front.is_finished() || self.pending.len() > self.window,
                None => false,
            };
            if !ready {
                break;
            }
            self.write_front().await?;
        }
        Ok(())
    }

    /// Write the remaining games and flush.
    pub async fn finish(&mut self) -> Result<(), WorkerError> {
        while !self.pending.is_empty() {
            self.write_front().await?;
        }
        self.out.flush()?;
        Ok(())
    }

    async fn write_front(&mut self) -> Result<(), WorkerError> {
        let Some((game_ref, task)) = self.pending.pop_front() else {
            return Ok(());
        };
        match task.await? {
            Ok(chunks) => {
                self.games += 1;
                for chunk in &chunks {
                    serde_json::to_writer(&mut self.out, chunk)?;
                    self.out.write_all(b"\n")?;
                }
                self.written += chunks.len();
            }
            Err(e) if e.is_malformed_input() => {
                warn!(game = %game_ref, error = %e, "Skipping malformed game");
                self.failed += 1;
            }
            Err(e) => {
                error!(game = %game_ref, error = %e, "Chunking failed");
                self.failed += 1;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
