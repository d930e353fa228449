//! Partitioning of an ordered input into fixed-size groups.

use crate::error::{Error, Result};

/// Split `items` into contiguous groups of `size` items each.
///
/// Every group holds exactly `size` items except possibly the last, which
/// holds the remainder. Concatenating the groups in order reproduces `items`.
/// An empty input yields no groups.
///
/// Fails with [`Error::InvalidArgument`] when `size` is zero.
pub fn create_batches<T>(items: &[T], size: usize) -> Result<Vec<&[T]>> {
    if size == 0 {
        return Err(Error::InvalidArgument(
            "expected a positive number as the batch size".to_string(),
        ));
    }

    Ok(items.chunks(size).collect())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_evenly() {
        let items = [1, 2, 3, 4];
        let batches = create_batches(&items, 2).unwrap();
        assert_eq!(batches, vec![&[1, 2][..], &[3, 4][..]]);
    }

    #[test]
    fn last_batch_holds_remainder() {
        let items = [1, 2, 3, 4, 5];
        let batches = create_batches(&items, 2).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2], &[5]);
    }

    #[test]
    fn size_larger_than_input_gives_single_batch() {
        let items = ["a", "b"];
        let batches = create_batches(&items, 10).unwrap();
        assert_eq!(batches, vec![&["a", "b"][..]]);
    }

    #[test]
    fn empty_input_gives_no_batches() {
        let items: [u8; 0] = [];
        assert!(create_batches(&items, 3).unwrap().is_empty());
    }

    #[test]
    fn zero_size_is_rejected() {
        let items = [1, 2, 3];
        assert!(matches!(
            create_batches(&items, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn partition_invariants_hold_for_all_small_shapes() {
        for len in 0..40usize {
            let items: Vec<usize> = (0..len).collect();
            for size in 1..12usize {
                let batches = create_batches(&items, size).unwrap();

                assert_eq!(batches.len(), len.div_ceil(size), "len={len} size={size}");

                if let Some((last, full)) = batches.split_last() {
                    assert!(full.iter().all(|b| b.len() == size));
                    let expected_last = if len % size == 0 { size } else { len % size };
                    assert_eq!(last.len(), expected_last);
                }

                let flattened: Vec<usize> = batches.concat();
                assert_eq!(flattened, items, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let items = vec![3, 1, 4, 1, 5, 9, 2, 6];
        assert_eq!(
            create_batches(&items, 3).unwrap(),
            create_batches(&items, 3).unwrap()
        );
    }
}
