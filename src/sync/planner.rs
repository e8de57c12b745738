//! Chunk planning over the missing block range.

use crate::types::Chunk;

/// Tile the half-open range `(local, target]` into chunks of `width` blocks.
///
/// `local` is the current local height, `None` when no chain exists yet.
/// The final chunk is truncated to end exactly at `target`. Returns an empty
/// plan when the local chain already reaches `target`.
pub fn plan_chunks(local: Option<u64>, target: u64, width: u64) -> Vec<Chunk> {
    debug_assert!(width > 0);
    let first = match local {
        Some(height) if height >= target => return Vec::new(),
        Some(height) => height + 1,
        None => 0,
    };

    let mut chunks = Vec::with_capacity(((target - first) / width + 1) as usize);
    let mut start = first;
    while start <= target {
        let end = (start + width - 1).min(target);
        chunks.push(Chunk {
            first: start,
            last: end,
        });
        start = end + 1;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_chain_plan() {
        let chunks = plan_chunks(None, 1200, 500);
        assert_eq!(
            chunks,
            vec![
                Chunk {
                    first: 0,
                    last: 499
                },
                Chunk {
                    first: 500,
                    last: 999
                },
                Chunk {
                    first: 1000,
                    last: 1200
                },
            ]
        );
    }

    #[test]
    fn test_incremental_plan() {
        let chunks = plan_chunks(Some(999), 1002, 500);
        assert_eq!(
            chunks,
            vec![Chunk {
                first: 1000,
                last: 1002
            }]
        );
    }

    #[test]
    fn test_already_synced_is_empty() {
        assert!(plan_chunks(Some(1200), 1200, 500).is_empty());
        assert!(plan_chunks(Some(1500), 1200, 500).is_empty());
    }

    #[test]
    fn test_single_block_plan() {
        let chunks = plan_chunks(Some(41), 42, 500);
        assert_eq!(
            chunks,
            vec![Chunk {
                first: 42,
                last: 42
            }]
        );
        assert_eq!(chunks[0].len(), 1);
    }

    #[test]
    fn test_exact_multiple_has_no_tail() {
        let chunks = plan_chunks(None, 999, 500);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].last, 999);
        assert_eq!(chunks[1].len(), 500);
    }

    #[test]
    fn test_tiling_partitions_the_range() {
        for (local, target, width) in [
            (None, 0, 500),
            (None, 1, 1),
            (None, 1200, 500),
            (Some(0), 1, 3),
            (Some(7), 1000, 13),
            (Some(999), 1002, 500),
            (None, 10_000, 499),
        ] {
            let chunks = plan_chunks(local, target, width);
            let first = local.map(|l| l + 1).unwrap_or(0);

            let mut expected = first;
            for chunk in &chunks {
                assert_eq!(chunk.first, expected, "gap or overlap at {}", chunk);
                assert!(chunk.last >= chunk.first);
                assert!(chunk.len() <= width);
                expected = chunk.last + 1;
            }
            assert_eq!(expected, target + 1, "plan must end at the target");
        }
    }
}
