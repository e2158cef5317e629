//! `int-ext-sort` is an external merge sort for files of integers.
//!
//! External sorting is required when the data being sorted do not fit into the main memory (RAM) of a computer
//! and instead must reside in slower external memory, usually a hard disk drive. This crate sorts a text file
//! holding one integer per line using a fixed-size working set and exactly four auxiliary files on disk.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! Sorting is done in two phases:
//!
//! * **Chunk splitting:**
//!   the input is read in groups of at most `chunk_size` integers, each group is sorted in memory and the sorted
//!   groups (chunks) are written alternately to two working files.
//! * **Merge passes:**
//!   pairs of chunks from two working files are merged into the other two working files, doubling the chunk size
//!   on every pass, until a pass produces a single chunk. The merge holds no more than two values in memory
//!   regardless of the input size.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use int_ext_sort::{ExternalSorter, ExternalSorterBuilder};
//!
//! let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!     .with_chunk_size(10)
//!     .with_tmp_dir(Path::new("./"))
//!     .build()
//!     .unwrap();
//!
//! let summary = sorter.sort_file(Path::new("input.txt"), Path::new("output.txt")).unwrap();
//! println!("{} items sorted in {} merge passes", summary.items, summary.passes);
//! ```

pub mod buffer;
pub mod merge;
pub mod slot;
pub mod sort;
pub mod split;
pub mod zipper;

pub use buffer::LimitedBuffer;
pub use merge::{MergeEngine, MergeSummary, PassLayout};
pub use slot::{SlotError, SlotReader, SlotWriter, WorkingSlots, SLOT_COUNT};
pub use sort::{ExternalSorter, ExternalSorterBuilder, Phase, SortError, SortSummary, SortedOutput, SortedValues};
pub use split::{ChunkSplitter, SplitSummary};
pub use zipper::Zipper;
