//! Cross-links between chunks of one game that reach the same position.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::chunk::{Chunk, TranspositionLink};
use crate::error::ChunkError;

/// Attach a transposition record to every chunk for each position it shares with
/// another chunk of the same game. Requires `visits` to be collected.
pub fn link(chunks: &mut [Chunk], game: &str) -> Result<(), ChunkError> {
    let mut ids = HashSet::new();
    for chunk in chunks.iter() {
        if !ids.insert(chunk.id.clone()) {
            return Err(ChunkError::Invariant {
                invariant: "unique chunk ids",
                game: game.to_string(),
                branch: chunk.metadata.branch_path.clone(),
                detail: format!("id {} assigned twice", chunk.id),
            });
        }
    }

    let mut index: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, chunk) in chunks.iter().enumerate() {
        for visit in &chunk.visits {
            index.entry(visit.position.as_str()).or_default().push(i);
        }
    }

    let links: Vec<Vec<TranspositionLink>> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            chunk
                .visits
                .iter()
                .filter_map(|visit| {
                    let bucket = index.get(visit.position.as_str())?;
                    if bucket.len() < 2 {
                        return None;
                    }
                    Some(TranspositionLink {
                        position: visit.position.clone(),
                        move_index: visit.ply,
                        linked_chunks: bucket
                            .iter()
                            .filter(|&&j| j != i)
                            .map(|&j| chunks[j].id.clone())
                            .collect(),
                    })
                })
                .collect()
        })
        .collect();

    let shared = index.values().filter(|bucket| bucket.len() > 1).count();
    drop(index);

    for (chunk, records) in chunks.iter_mut().zip(links) {
        for record in &records {
            if let Some(target) = record
                .linked_chunks
                .iter()
                .find(|id| !ids.contains(*id) || **id == chunk.id)
            {
                return Err(ChunkError::Invariant {
                    invariant: "link targets exist",
                    game: game.to_string(),
                    branch: chunk.metadata.branch_path.clone(),
                    detail: format!("link to {target} at {}", record.position),
                });
            }
        }
        chunk.metadata.transpositions = records;
    }

    debug!(game, shared_positions = shared, "Linked transpositions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkMetadata, PositionVisit};

    fn chunk(id: &str, visits: &[(&str, u32)]) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: String::new(),
            token_count: 0,
            overflow: false,
            metadata: ChunkMetadata::default(),
            scopes: Vec::new(),
            visits: visits
                .iter()
                .map(|(position, ply)| PositionVisit {
                    position: position.to_string(),
                    ply: *ply,
                })
                .collect(),
        }
    }

    #[test]
    fn test_links_are_symmetric() {
        let mut chunks = vec![
            chunk("a", &[("p1", 1), ("shared", 4)]),
            chunk("b", &[("p2", 3), ("shared", 6)]),
            chunk("c", &[("p3", 2)]),
        ];
        link(&mut chunks, "g.pgn#1").unwrap();

        let a = &chunks[0].metadata.transpositions;
        let b = &chunks[1].metadata.transpositions;
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].position, "shared");
        assert_eq!(a[0].move_index, 4);
        assert_eq!(a[0].linked_chunks, vec!["b"]);
        assert_eq!(b[0].move_index, 6);
        assert_eq!(b[0].linked_chunks, vec!["a"]);
        assert!(chunks[2].metadata.transpositions.is_empty());
    }

    #[test]
    fn test_no_shared_positions() {
        let mut chunks = vec![chunk("a", &[("p1", 1)]), chunk("b", &[("p2", 1)])];
        link(&mut chunks, "g.pgn#1").unwrap();
        assert!(chunks.iter().all(|c| c.metadata.transpositions.is_empty()));
    }

    #[test]
    fn test_three_way_bucket() {
        let mut chunks = vec![
            chunk("a", &[("x", 5)]),
            chunk("b", &[("x", 7)]),
            chunk("c", &[("x", 5)]),
        ];
        link(&mut chunks, "g.pgn#1").unwrap();
        assert_eq!(chunks[1].metadata.transpositions[0].linked_chunks, vec!["a", "c"]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut chunks = vec![chunk("a", &[]), chunk("a", &[])];
        let err = link(&mut chunks, "g.pgn#1").unwrap_err();
        assert!(matches!(
            err,
            ChunkError::Invariant {
                invariant: "unique chunk ids",
                ..
            }
        ));
    }
}
