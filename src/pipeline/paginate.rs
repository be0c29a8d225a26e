//! Capacity-based pagination of long line sequences.
//!
//! Pages are fixed-size and the layout is not measured, so overflow is
//! handled by line count alone: the first page takes `first_page_capacity`
//! lines (it shares its page with the project overview) and each
//! continuation page takes `continuation_capacity`. Boundaries depend only
//! on the line count, never on content.

/// Lines split across a first page and its continuation pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination<T> {
    pub first_chunk: Vec<T>,
    pub continuation_chunks: Vec<Vec<T>>,
}

impl<T> Pagination<T> {
    /// Total number of lines across all chunks.
    pub fn line_count(&self) -> usize {
        self.first_chunk.len() + self.continuation_chunks.iter().map(Vec::len).sum::<usize>()
    }
}

/// Split `lines` into a first chunk and continuation chunks.
///
/// A capacity of zero is treated as one so every line lands somewhere.
pub fn paginate<T: Clone>(
    lines: &[T],
    first_page_capacity: usize,
    continuation_capacity: usize,
) -> Pagination<T> {
    let first_page_capacity = first_page_capacity.max(1);
    let continuation_capacity = continuation_capacity.max(1);

    let split = first_page_capacity.min(lines.len());
    let (first, rest) = lines.split_at(split);

    Pagination {
        first_chunk: first.to_vec(),
        continuation_chunks: rest
            .chunks(continuation_capacity)
            .map(<[T]>::to_vec)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn empty_input_has_no_continuations() {
        let p = paginate::<usize>(&[], 15, 25);
        assert!(p.first_chunk.is_empty());
        assert!(p.continuation_chunks.is_empty());
    }

    #[test]
    fn short_input_fits_first_page() {
        let p = paginate(&numbered(9), 15, 25);
        assert_eq!(p.first_chunk.len(), 9);
        assert!(p.continuation_chunks.is_empty());
    }

    #[test]
    fn overflow_is_chunked_by_continuation_capacity() {
        let p = paginate(&numbered(70), 15, 25);
        assert_eq!(p.first_chunk, (0..15).collect::<Vec<_>>());
        let sizes: Vec<usize> = p.continuation_chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 25, 5]);
        assert_eq!(p.continuation_chunks[2][0], 65);
    }

    #[test]
    fn exact_fit_does_not_emit_empty_page() {
        let p = paginate(&numbered(40), 15, 25);
        assert_eq!(p.continuation_chunks.len(), 1);
        assert_eq!(p.continuation_chunks[0].len(), 25);
    }

    #[test]
    fn conservation_and_full_chunks() {
        for n in 0..120 {
            for (first, cont) in [(1, 1), (3, 7), (15, 25), (30, 10)] {
                let p = paginate(&numbered(n), first, cont);
                assert_eq!(p.line_count(), n, "n={n} first={first} cont={cont}");
                if n > first {
                    assert_eq!(p.first_chunk.len(), first);
                }
                if let Some((_last, full)) = p.continuation_chunks.split_last() {
                    assert!(full.iter().all(|c| c.len() == cont));
                }
                let flat: Vec<usize> = p
                    .first_chunk
                    .iter()
                    .chain(p.continuation_chunks.iter().flatten())
                    .copied()
                    .collect();
                assert_eq!(flat, numbered(n), "order must be preserved");
            }
        }
    }

    #[test]
    fn deterministic() {
        let lines = numbered(58);
        assert_eq!(paginate(&lines, 15, 25), paginate(&lines, 15, 25));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let p = paginate(&numbered(3), 0, 0);
        assert_eq!(p.first_chunk.len(), 1);
        assert_eq!(p.continuation_chunks.len(), 2);
    }
}
