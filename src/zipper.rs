//! Two-stream chunk merge cursor.

use std::io::BufRead;

use crate::slot::{SlotError, SlotReader};

/// Merges one chunk from each of two sorted input streams into a single sorted sequence.
///
/// A chunk is a run of at most `chunk_size` values. The zipper never consumes more than `chunk_size` values
/// from a stream between two [`Zipper::begin_chunk`] calls, so the values that follow belong to the next chunk
/// pair. At most one value per stream is buffered at any time.
///
/// Usage:
/// ```text
/// while zipper.begin_chunk()? {
///     while let Some(value) = zipper.next_value()? {
///         ...
///     }
/// }
/// ```
pub struct Zipper<R> {
    streams: [SlotReader<R>; 2],
    chunk_size: usize,
    // values consumed from the current chunk of each stream
    consumed: [usize; 2],
    heads: [Option<i64>; 2],
}

impl<R: BufRead> Zipper<R> {
    /// Creates a zipper over two streams holding chunks of `chunk_size` sorted values.
    pub fn new(streams: [SlotReader<R>; 2], chunk_size: usize) -> Self {
        Zipper {
            streams,
            chunk_size,
            consumed: [0, 0],
            heads: [None, None],
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Starts merging the next chunk pair.
    /// Returns `false` if both streams are exhausted.
    ///
    /// The previous chunk pair must be drained with [`Zipper::next_value`] first.
    pub fn begin_chunk(&mut self) -> Result<bool, SlotError> {
        debug_assert!(self.heads.iter().all(Option::is_none), "previous chunk is not drained");

        for idx in 0..2 {
            self.heads[idx] = self.streams[idx].next_value()?;
            self.consumed[idx] = if self.heads[idx].is_some() { 1 } else { 0 };
        }

        return Ok(self.heads.iter().any(Option::is_some));
    }

    /// Returns the smallest value of the current chunk pair or [`None`] if the chunk pair is drained.
    /// Equal values are taken from the first stream first.
    pub fn next_value(&mut self) -> Result<Option<i64>, SlotError> {
        let mut selected: Option<usize> = None;

        for idx in 0..2 {
            if self.heads[idx].is_none() && self.consumed[idx] < self.chunk_size {
                if let Some(value) = self.streams[idx].next_value()? {
                    self.heads[idx] = Some(value);
                    self.consumed[idx] += 1;
                }
            }

            let value = match self.heads[idx] {
                Some(value) => value,
                None => continue,
            };
            selected = match selected {
                Some(prev) if self.heads[prev].map_or(false, |prev_value| prev_value <= value) => Some(prev),
                _ => Some(idx),
            };
        }

        return Ok(selected.and_then(|idx| self.heads[idx].take()));
    }

    /// Returns the number of currently buffered values.
    pub fn buffered(&self) -> usize {
        self.heads.iter().filter(|head| head.is_some()).count()
    }

    /// Returns the number of values consumed from the current chunk of each stream.
    pub fn consumed(&self) -> [usize; 2] {
        self.consumed
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use rstest::*;

    use super::Zipper;
    use crate::slot::SlotReader;

    fn zipper(first: &str, second: &str, chunk_size: usize) -> Zipper<io::Cursor<String>> {
        Zipper::new(
            [
                SlotReader::new(0, io::Cursor::new(first.to_string())),
                SlotReader::new(1, io::Cursor::new(second.to_string())),
            ],
            chunk_size,
        )
    }

    fn drain_chunks(zipper: &mut Zipper<io::Cursor<String>>) -> Vec<Vec<i64>> {
        let mut chunks = Vec::new();
        while zipper.begin_chunk().unwrap() {
            let mut chunk = Vec::new();
            while let Some(value) = zipper.next_value().unwrap() {
                assert!(zipper.buffered() <= 2);
                assert!(zipper.consumed().iter().all(|consumed| *consumed <= zipper.chunk_size()));
                chunk.push(value);
            }
            chunks.push(chunk);
        }
        chunks
    }

    #[rstest]
    #[case("", "", 3, vec![])]
    #[case("1\n6\n10\n", "", 3, vec![vec![1, 6, 10]])]
    #[case("", "3\n7\n8\n", 3, vec![vec![3, 7, 8]])]
    #[case(
        "1\n6\n10\n4\n5\n9\n",
        "3\n7\n8\n0\n2\n",
        3,
        vec![vec![1, 3, 6, 7, 8, 10], vec![0, 2, 4, 5, 9]],
    )]
    #[case(
        "1\n3\n6\n7\n8\n10\n",
        "0\n2\n4\n5\n9\n",
        6,
        vec![vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]],
    )]
    #[case(
        "1\n5\n2\n3\n",
        "4\n6\n0\n9\n",
        2,
        vec![vec![1, 4, 5, 6], vec![0, 2, 3, 9]],
    )]
    #[case(
        "7\n2\n4\n",
        "1\n",
        1,
        vec![vec![1, 7], vec![2], vec![4]],
    )]
    fn test_zipper(
        #[case] first: &str,
        #[case] second: &str,
        #[case] chunk_size: usize,
        #[case] expected: Vec<Vec<i64>>,
    ) {
        let mut zipper = zipper(first, second, chunk_size);
        assert_eq!(drain_chunks(&mut zipper), expected);
    }

    #[test]
    fn test_chunk_boundary() {
        let mut zipper = zipper("1\n5\n2\n", "4\n6\n0\n", 2);

        assert!(zipper.begin_chunk().unwrap());
        assert_eq!(zipper.next_value().unwrap(), Some(1));
        assert_eq!(zipper.next_value().unwrap(), Some(4));
        assert_eq!(zipper.next_value().unwrap(), Some(5));
        assert_eq!(zipper.next_value().unwrap(), Some(6));
        // "2" and "0" belong to the next chunk pair
        assert_eq!(zipper.next_value().unwrap(), None);
        assert_eq!(zipper.consumed(), [2, 2]);
        assert_eq!(zipper.buffered(), 0);

        assert!(zipper.begin_chunk().unwrap());
        assert_eq!(zipper.next_value().unwrap(), Some(0));
        assert_eq!(zipper.next_value().unwrap(), Some(2));
        assert_eq!(zipper.next_value().unwrap(), None);

        assert_eq!(zipper.begin_chunk().unwrap(), false);
    }

    #[test]
    fn test_ties_prefer_first_stream() {
        let mut zipper = zipper("5\n", "5\n", 1);

        assert!(zipper.begin_chunk().unwrap());
        assert_eq!(zipper.buffered(), 2);
        assert_eq!(zipper.next_value().unwrap(), Some(5));
        assert_eq!(zipper.heads, [None, Some(5)]);
        assert_eq!(zipper.next_value().unwrap(), Some(5));
        assert_eq!(zipper.next_value().unwrap(), None);
    }

    #[test]
    fn test_stream_error() {
        let mut zipper = zipper("1\n2\n", "3\nx\n", 2);

        assert!(zipper.begin_chunk().unwrap());
        assert_eq!(zipper.next_value().unwrap(), Some(1));
        assert_eq!(zipper.next_value().unwrap(), Some(2));
        assert_eq!(zipper.next_value().unwrap(), Some(3));
        let err = zipper.next_value().err().unwrap();
        assert_eq!(err.slot, 1);
    }
}
