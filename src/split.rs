//! Initial chunk splitter.

use std::io::BufRead;

use crate::buffer::LimitedBuffer;
use crate::slot::{SlotWriter, WorkingSlots};
use crate::sort::{Phase, SortError};

/// Chunk splitting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    /// Number of integers read from the input.
    pub items: usize,
    /// Number of sorted chunks written.
    pub chunks: usize,
    /// Maximum number of integers held in memory at once.
    pub peak_buffered: usize,
    /// Slots the chunks were written to.
    pub outputs: [usize; 2],
}

/// Reads the unsorted input in groups of at most `chunk_size` integers, sorts every group in memory and writes
/// the sorted groups alternately to slots 0 and 1, seeding the first merge pass with chunks larger than one.
pub struct ChunkSplitter<'a> {
    slots: &'a WorkingSlots,
    chunk_size: usize,
    rw_buf_size: Option<usize>,
}

impl<'a> ChunkSplitter<'a> {
    pub const OUTPUTS: [usize; 2] = [0, 1];

    /// Creates a splitter writing chunks of `chunk_size` integers into `slots`.
    pub fn new(slots: &'a WorkingSlots, chunk_size: usize, rw_buf_size: Option<usize>) -> Self {
        ChunkSplitter {
            slots,
            chunk_size,
            rw_buf_size,
        }
    }

    /// Splits the input into sorted chunks.
    ///
    /// # Arguments
    /// * `input` - Text stream holding one integer per line, blank lines are skipped
    pub fn split<R: BufRead>(&self, input: R) -> Result<SplitSummary, SortError> {
        if self.chunk_size < 1 {
            return Err(SortError::InvalidChunkSize(self.chunk_size));
        }

        let [first, second] = Self::OUTPUTS;
        let mut writers = [
            self.slots
                .create_writer(first, self.rw_buf_size)
                .map_err(|err| SortError::slot(Phase::Split, err))?,
            self.slots
                .create_writer(second, self.rw_buf_size)
                .map_err(|err| SortError::slot(Phase::Split, err))?,
        ];

        let mut buffer = LimitedBuffer::new(self.chunk_size);
        let mut items = 0;
        let mut chunks = 0;
        let mut peak_buffered = 0;

        for (idx, line) in input.lines().enumerate() {
            let line = line.map_err(SortError::InputError)?;
            let value = line.trim();
            if value.is_empty() {
                continue;
            }

            let value = value.parse::<i64>().map_err(|err| SortError::MalformedInput {
                line: idx + 1,
                value: value.to_string(),
                source: err,
            })?;
            buffer.push(value);
            items += 1;
            peak_buffered = peak_buffered.max(buffer.len());

            if buffer.is_full() {
                Self::dump_chunk(&mut buffer, &mut writers[chunks % 2])?;
                chunks += 1;
            }
        }

        if !buffer.is_empty() {
            Self::dump_chunk(&mut buffer, &mut writers[chunks % 2])?;
            chunks += 1;
        }

        for writer in writers.iter_mut() {
            writer.finish().map_err(|err| SortError::slot(Phase::Split, err))?;
        }

        log::info!("input split done (items: {}, chunks: {})", items, chunks);

        return Ok(SplitSummary {
            items,
            chunks,
            peak_buffered,
            outputs: Self::OUTPUTS,
        });
    }

    fn dump_chunk<W: std::io::Write>(
        buffer: &mut LimitedBuffer<i64>,
        writer: &mut SlotWriter<W>,
    ) -> Result<(), SortError> {
        log::debug!("saving chunk of {} items to slot {}", buffer.len(), writer.slot());

        buffer.sort();
        for value in buffer.drain() {
            writer.write_value(value).map_err(|err| SortError::slot(Phase::Split, err))?;
        }

        return Ok(());
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::ChunkSplitter;
    use crate::slot::WorkingSlots;
    use crate::sort::SortError;

    #[fixture]
    fn slots() -> WorkingSlots {
        WorkingSlots::new(None).unwrap()
    }

    fn read_slot(slots: &WorkingSlots, slot: usize) -> Vec<i64> {
        fs::read_to_string(slots.path(slot))
            .unwrap()
            .lines()
            .map(|line| line.parse().unwrap())
            .collect()
    }

    #[rstest]
    #[case("", 3, vec![], vec![], 0)]
    #[case("\n\n  \n", 3, vec![], vec![], 0)]
    #[case("42\n", 3, vec![42], vec![], 1)]
    #[case(
        "10\n1\n6\n3\n8\n7\n5\n9\n4\n2\n0\n",
        3,
        vec![1, 6, 10, 4, 5, 9],
        vec![3, 7, 8, 0, 2],
        4,
    )]
    #[case(
        "6\n5\n4\n3\n2\n1\n",
        2,
        vec![5, 6, 1, 2],
        vec![3, 4],
        3,
    )]
    #[case("3\n\n1\n 2 \n\n", 2, vec![1, 3], vec![2], 2)]
    #[case("3\n-1\n2\n", 10, vec![-1, 2, 3], vec![], 1)]
    fn test_split(
        slots: WorkingSlots,
        #[case] input: &str,
        #[case] chunk_size: usize,
        #[case] expected_first: Vec<i64>,
        #[case] expected_second: Vec<i64>,
        #[case] expected_chunks: usize,
    ) {
        let splitter = ChunkSplitter::new(&slots, chunk_size, None);
        let summary = splitter.split(io::Cursor::new(input)).unwrap();

        assert_eq!(summary.chunks, expected_chunks);
        assert_eq!(summary.items, expected_first.len() + expected_second.len());
        assert!(summary.peak_buffered <= chunk_size);
        assert_eq!(summary.outputs, [0, 1]);
        assert_eq!(read_slot(&slots, 0), expected_first);
        assert_eq!(read_slot(&slots, 1), expected_second);
    }

    #[rstest]
    fn test_split_memory_bound(slots: WorkingSlots) {
        let input: String = (0..1000).rev().map(|value| format!("{}\n", value)).collect();

        let summary = ChunkSplitter::new(&slots, 7, None).split(io::Cursor::new(input)).unwrap();

        assert_eq!(summary.items, 1000);
        assert_eq!(summary.chunks, 143);
        assert_eq!(summary.peak_buffered, 7);
    }

    #[rstest]
    fn test_split_malformed_input(slots: WorkingSlots) {
        let err = ChunkSplitter::new(&slots, 2, None)
            .split(io::Cursor::new("1\n\n2x\n3\n"))
            .err()
            .unwrap();

        match err {
            SortError::MalformedInput { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "2x");
            }
            err => panic!("unexpected error: {}", err),
        }
    }

    #[rstest]
    fn test_split_invalid_chunk_size(slots: WorkingSlots) {
        let err = ChunkSplitter::new(&slots, 0, None).split(io::Cursor::new("1\n")).err().unwrap();

        assert!(matches!(err, SortError::InvalidChunkSize(0)));
        assert!(fs::metadata(slots.path(0)).is_err());
    }
}
