//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::BufRead;
use std::marker::PhantomData;
use std::num::ParseIntError;
use std::path::Path;

use crate::merge::MergeEngine;
use crate::slot::{SlotError, SlotReader, WorkingSlots};
use crate::split::ChunkSplitter;

/// Default number of integers sorted in memory at once.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Sorting phase an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial chunk splitting.
    Split,
    /// Merge pass.
    Merge { pass: usize },
    /// Reading or persisting the result.
    Finalize,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Split => write!(f, "split"),
            Phase::Merge { pass } => write!(f, "merge pass {}", pass),
            Phase::Finalize => write!(f, "finalize"),
        }
    }
}

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Chunk size is less than one.
    InvalidChunkSize(usize),
    /// Input line is not an integer.
    MalformedInput {
        line: usize,
        value: String,
        source: ParseIntError,
    },
    /// Input data stream error.
    InputError(io::Error),
    /// Temporary directory creation or removal error.
    TempDir(io::Error),
    /// Working slot I/O error.
    SlotIO {
        phase: Phase,
        slot: usize,
        source: io::Error,
    },
    /// Result persisting error.
    OutputError(io::Error),
}

impl SortError {
    pub(crate) fn slot(phase: Phase, err: SlotError) -> Self {
        SortError::SlotIO {
            phase,
            slot: err.slot,
            source: err.source,
        }
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::InvalidChunkSize(_) => None,
            SortError::MalformedInput { source, .. } => Some(source),
            SortError::InputError(err) => Some(err),
            SortError::TempDir(err) => Some(err),
            SortError::SlotIO { source, .. } => Some(source),
            SortError::OutputError(err) => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InvalidChunkSize(size) => write!(f, "chunk size must be at least 1, got {}", size),
            SortError::MalformedInput { line, value, source } => {
                write!(f, "malformed input at line {} ({:?}): {}", line, value, source)
            }
            SortError::InputError(err) => write!(f, "input data stream error: {}", err),
            SortError::TempDir(err) => write!(f, "temporary directory error: {}", err),
            SortError::SlotIO { phase, slot, source } => {
                write!(f, "working slot {} I/O failed during {}: {}", slot, phase, source)
            }
            SortError::OutputError(err) => write!(f, "output persisting error: {}", err),
        }
    }
}

/// Sorting statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of sorted integers.
    pub items: usize,
    /// Number of chunks produced by the splitter.
    pub initial_chunks: usize,
    /// Number of merge passes executed.
    pub passes: usize,
    /// Working slot holding the result.
    pub result_slot: usize,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Number of integers sorted in memory at once.
    chunk_size: usize,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Working file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(self.chunk_size, self.tmp_dir.as_deref(), self.rw_buf_size)
    }

    /// Sets number of integers sorted in memory at once.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> ExternalSorterBuilder {
        self.chunk_size = chunk_size;
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets working file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            chunk_size: DEFAULT_CHUNK_SIZE,
            tmp_dir: None,
            rw_buf_size: None,
        }
    }
}

/// External sorter.
pub struct ExternalSorter {
    /// Number of integers sorted in memory at once.
    chunk_size: usize,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Working file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `chunk_size` - Number of integers sorted in memory at once, must be at least 1.
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `rw_buf_size` - Working files read/write buffer size.
    pub fn new(chunk_size: usize, tmp_path: Option<&Path>, rw_buf_size: Option<usize>) -> Result<Self, SortError> {
        if chunk_size < 1 {
            return Err(SortError::InvalidChunkSize(chunk_size));
        }

        return Ok(ExternalSorter {
            chunk_size,
            tmp_dir: tmp_path.map(Box::from),
            rw_buf_size,
        });
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sorts integers from the input.
    /// Returns the sorted output stored in a working slot.
    ///
    /// # Arguments
    /// * `input` - Text stream holding one integer per line
    pub fn sort<R: BufRead>(&self, input: R) -> Result<SortedOutput, SortError> {
        let slots = WorkingSlots::new(self.tmp_dir.as_deref()).map_err(SortError::TempDir)?;
        log::info!(
            "sorting (chunk size: {}, working directory: {})",
            self.chunk_size,
            slots.dir().display()
        );

        let split = ChunkSplitter::new(&slots, self.chunk_size, self.rw_buf_size).split(input)?;

        // a single chunk is already sorted in memory
        let (result_slot, passes) = if split.chunks <= 1 {
            (split.outputs[0], 0)
        } else {
            let merged = MergeEngine::new(&slots, self.rw_buf_size).merge(self.chunk_size)?;
            (merged.result_slot, merged.passes)
        };

        log::info!("external sort done (items: {}, merge passes: {})", split.items, passes);

        return Ok(SortedOutput {
            slots,
            summary: SortSummary {
                items: split.items,
                initial_chunks: split.chunks,
                passes,
                result_slot,
            },
            rw_buf_size: self.rw_buf_size,
        });
    }

    /// Sorts the `input` file writing the result to the `output` file.
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        let file = fs::File::open(input).map_err(SortError::InputError)?;
        let reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        let sorted = self.sort(reader)?;
        let summary = sorted.summary();
        sorted.persist(output)?;

        return Ok(summary);
    }
}

/// Sorted data stored in a working slot.
/// Working slots are removed when the instance is persisted or dropped.
pub struct SortedOutput {
    slots: WorkingSlots,
    summary: SortSummary,
    rw_buf_size: Option<usize>,
}

impl SortedOutput {
    /// Returns the index of the slot holding the result.
    pub fn result_slot(&self) -> usize {
        self.summary.result_slot
    }

    /// Returns the path of the result file.
    pub fn path(&self) -> &Path {
        self.slots.path(self.summary.result_slot)
    }

    pub fn summary(&self) -> SortSummary {
        self.summary
    }

    /// Returns an iterator over the sorted integers.
    pub fn values(&self) -> Result<SortedValues<'_>, SortError> {
        let reader = self
            .slots
            .open_reader(self.summary.result_slot, self.rw_buf_size)
            .map_err(|err| SortError::slot(Phase::Finalize, err))?;

        return Ok(SortedValues {
            reader,
            output: PhantomData,
        });
    }

    /// Moves the result to `output` and removes the working slots.
    pub fn persist(self, output: &Path) -> Result<(), SortError> {
        if let Err(err) = fs::rename(self.path(), output) {
            // working directory may reside on another file system
            log::debug!("result renaming failed ({}), copying instead", err);
            fs::copy(self.path(), output).map_err(SortError::OutputError)?;
        }
        log::info!("sorted data saved to {}", output.display());

        return self.slots.close().map_err(SortError::TempDir);
    }
}

/// Sorted integers iterator.
pub struct SortedValues<'a> {
    reader: SlotReader<io::BufReader<fs::File>>,
    output: PhantomData<&'a SortedOutput>,
}

impl<'a> Iterator for SortedValues<'a> {
    type Item = Result<i64, SortError>;

    /// Returns the next integer in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_value() {
            Ok(value) => value.map(Ok),
            Err(err) => Some(Err(SortError::slot(Phase::Finalize, err))),
        }
    }
}
