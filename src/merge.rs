//! Merge engine.

use crate::slot::{SlotError, WorkingSlots, SLOT_COUNT};
use crate::sort::{Phase, SortError};
use crate::zipper::Zipper;

/// Slots read and written by a single merge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassLayout {
    pub inputs: [usize; 2],
    pub outputs: [usize; 2],
}

impl PassLayout {
    /// Returns the layout of a pass. Even passes read slots 0 and 1 and write slots 2 and 3,
    /// odd passes do the opposite.
    pub fn for_pass(pass: usize) -> Self {
        let input_base = (pass % 2) * 2;
        let output_base = (input_base + 2) % SLOT_COUNT;

        PassLayout {
            inputs: [input_base, input_base + 1],
            outputs: [output_base, output_base + 1],
        }
    }
}

/// Merge passes result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Slot holding the whole sorted sequence.
    pub result_slot: usize,
    /// Number of merge passes executed.
    pub passes: usize,
    /// Chunk size of the last pass.
    pub chunk_size: usize,
}

/// Merge engine.
/// Merges chunks of two working slots pairwise into the other two slots doubling the chunk size until
/// a pass produces a single chunk. Time complexity is *n* \* log(*n* / *c*) where *n* is the number of items
/// and *c* is the initial chunk size, memory consumption does not depend on the input size.
pub struct MergeEngine<'a> {
    slots: &'a WorkingSlots,
    rw_buf_size: Option<usize>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(slots: &'a WorkingSlots, rw_buf_size: Option<usize>) -> Self {
        MergeEngine { slots, rw_buf_size }
    }

    /// Runs merge passes over slots 0 and 1 holding sorted chunks of `chunk_size` items
    /// and returns the slot containing the result.
    pub fn merge(&self, chunk_size: usize) -> Result<MergeSummary, SortError> {
        if chunk_size < 1 {
            return Err(SortError::InvalidChunkSize(chunk_size));
        }

        let mut chunk_size = chunk_size;
        let mut pass = 0;

        loop {
            let layout = PassLayout::for_pass(pass);
            let chunks = self.merge_pass(pass, layout, chunk_size)?;

            log::debug!(
                "merge pass {} done (chunk size: {}, merged chunks: {}, slots: {:?} -> {:?})",
                pass,
                chunk_size,
                chunks,
                layout.inputs,
                layout.outputs
            );

            if chunks <= 1 {
                log::info!("merge done (passes: {}, result slot: {})", pass + 1, layout.outputs[0]);

                return Ok(MergeSummary {
                    result_slot: layout.outputs[0],
                    passes: pass + 1,
                    chunk_size,
                });
            }

            chunk_size = chunk_size.saturating_mul(2);
            pass += 1;
        }
    }

    /// Merges all chunk pairs of the pass input slots. Returns the number of merged chunks.
    fn merge_pass(&self, pass: usize, layout: PassLayout, chunk_size: usize) -> Result<usize, SortError> {
        let phase = Phase::Merge { pass };
        let slot_err = |err: SlotError| SortError::slot(phase, err);

        let [first_input, second_input] = layout.inputs;
        let [first_output, second_output] = layout.outputs;

        let streams = [
            self.slots.open_reader(first_input, self.rw_buf_size).map_err(slot_err)?,
            self.slots.open_reader(second_input, self.rw_buf_size).map_err(slot_err)?,
        ];
        let mut writers = [
            self.slots.create_writer(first_output, self.rw_buf_size).map_err(slot_err)?,
            self.slots.create_writer(second_output, self.rw_buf_size).map_err(slot_err)?,
        ];

        let mut zipper = Zipper::new(streams, chunk_size);
        let mut chunk_idx = 0;

        while zipper.begin_chunk().map_err(slot_err)? {
            let writer = &mut writers[chunk_idx % 2];
            while let Some(value) = zipper.next_value().map_err(slot_err)? {
                writer.write_value(value).map_err(slot_err)?;
            }
            chunk_idx += 1;
        }

        for writer in writers.iter_mut() {
            writer.finish().map_err(slot_err)?;
        }

        return Ok(chunk_idx);
    }
}
