//! Folding undersized chunks into their neighbours.

use std::collections::VecDeque;

use tracing::debug;

use crate::chunk::Chunk;
use crate::tokens::TokenCounter;

/// Separator placed between the texts of merged chunks.
pub const MERGE_BOUNDARY: &str = "\n\n";

/// Merge chunks under `min_tokens` with their successor (preferred) or predecessor,
/// never producing a chunk over `max_tokens`. Running it again on its own output
/// changes nothing.
pub fn merge(
    chunks: Vec<Chunk>,
    min_tokens: usize,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Vec<Chunk> {
    let mut pending: VecDeque<Chunk> = chunks.into();
    let mut out: Vec<Chunk> = Vec::with_capacity(pending.len());

    while let Some(current) = pending.pop_front() {
        if current.token_count >= min_tokens {
            out.push(current);
            continue;
        }

        if let Some(next) = pending.front() {
            if let Some(merged) = try_merge(&current, next, max_tokens, counter) {
                debug!(survivor = %current.id, absorbed = %next.id, tokens = merged.token_count, "Merged into successor");
                pending.pop_front();
                pending.push_front(merged);
                continue;
            }
        }

        if let Some(prev) = out.last() {
            if let Some(merged) = try_merge(prev, &current, max_tokens, counter) {
                debug!(survivor = %prev.id, absorbed = %current.id, tokens = merged.token_count, "Merged into predecessor");
                out.pop();
                pending.push_front(merged);
                continue;
            }
        }

        out.push(current);
    }

    out
}

/// Concatenate `first` and `second`, keeping `first`'s identity.
fn try_merge(
    first: &Chunk,
    second: &Chunk,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Option<Chunk> {
    if first.overflow || second.overflow {
        return None;
    }

    let text = format!("{}{MERGE_BOUNDARY}{}", first.text, second.text);
    let token_count = counter.count_tokens(&text);
    if token_count > max_tokens {
        return None;
    }

    let mut merged = first.clone();
    merged.text = text;
    merged.token_count = token_count;
    for label in &second.metadata.branch_labels {
        if !merged.metadata.branch_labels.contains(label) {
            merged.metadata.branch_labels.push(label.clone());
        }
    }
    for position in &second.metadata.positions {
        if !merged.metadata.positions.contains(position) {
            merged.metadata.positions.push(position.clone());
        }
    }
    merged.scopes.extend(second.scopes.iter().cloned());
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkMetadata;

    struct Words;

    impl TokenCounter for Words {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn chunk(id: &str, words: usize) -> Chunk {
        let text = vec![id; words].join(" ");
        Chunk {
            id: id.to_string(),
            token_count: words,
            text,
            overflow: false,
            metadata: ChunkMetadata {
                branch_labels: vec![format!("label {id}")],
                ..Default::default()
            },
            scopes: Vec::new(),
            visits: Vec::new(),
        }
    }

    #[test]
    fn test_three_small_chunks_merge() {
        let input = vec![chunk("a", 3), chunk("b", 3), chunk("c", 3)];
        let merged = merge(input, 5, 7, &Words);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "a");
        assert_eq!(merged[0].token_count, 6);
        assert_eq!(merged[0].metadata.branch_labels, vec!["label a", "label b"]);
        assert!(merged.iter().all(|c| c.token_count <= 7));

        let again = merge(merged.clone(), 5, 7, &Words);
        assert_eq!(again, merged);
    }

    #[test]
    fn test_falls_back_to_predecessor() {
        let input = vec![chunk("a", 4), chunk("b", 2), chunk("c", 9)];
        let merged = merge(input, 5, 10, &Words);
        let ids: Vec<&str> = merged.iter().map(|c| c.id.as_str()).collect();
        // a+b fits, b+c would overflow
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(merged[0].token_count, 6);
        assert_eq!(merge(merged.clone(), 5, 10, &Words), merged);
    }

    #[test]
    fn test_standalone_when_no_merge_fits() {
        let input = vec![chunk("a", 9), chunk("b", 2), chunk("c", 9)];
        let merged = merge(input, 5, 10, &Words);
        assert_eq!(merged.len(), 3);
        assert_eq!(merge(merged.clone(), 5, 10, &Words), merged);
    }

    #[test]
    fn test_overflow_chunks_never_merge() {
        let mut big = chunk("big", 3);
        big.overflow = true;
        let merged = merge(vec![big, chunk("b", 1)], 5, 100, &Words);
        assert_eq!(merged.len(), 2);
    }
}
