//! Working file slots.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use tempfile;

/// Number of working files used by the sort.
pub const SLOT_COUNT: usize = 4;

/// Working slot I/O error.
#[derive(Debug)]
pub struct SlotError {
    /// Index of the slot the operation failed on.
    pub slot: usize,
    /// Underlying I/O error.
    pub source: io::Error,
}

impl SlotError {
    pub fn new(slot: usize, source: io::Error) -> Self {
        SlotError { slot, source }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}: {}", self.slot, self.source)
    }
}

/// Four working files stored in a private temporary directory.
/// The directory and all the slots are removed when the instance is closed or dropped.
pub struct WorkingSlots {
    dir: tempfile::TempDir,
    paths: [PathBuf; SLOT_COUNT],
}

impl WorkingSlots {
    /// Creates a working directory for the slots.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory the working directory is created in. If the parameter is [`None`] default OS
    ///   temporary directory is used.
    pub fn new(tmp_path: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("int-ext-sort-");
        let dir = match tmp_path {
            Some(tmp_path) => builder.tempdir_in(tmp_path),
            None => builder.tempdir(),
        }?;

        let paths = [0, 1, 2, 3].map(|slot| dir.path().join(format!("slot{}.txt", slot)));
        log::debug!("working slots directory: {}", dir.path().display());

        return Ok(WorkingSlots { dir, paths });
    }

    /// Returns the directory slots are stored in.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of a slot file.
    ///
    /// # Panics
    /// Panics if `slot` is not less than [`SLOT_COUNT`].
    pub fn path(&self, slot: usize) -> &Path {
        &self.paths[slot]
    }

    /// Opens a slot for sequential reading.
    pub fn open_reader(
        &self,
        slot: usize,
        buf_size: Option<usize>,
    ) -> Result<SlotReader<io::BufReader<fs::File>>, SlotError> {
        let file = fs::File::open(self.path(slot)).map_err(|err| SlotError::new(slot, err))?;
        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(SlotReader::new(slot, reader));
    }

    /// Creates (or truncates) a slot for sequential writing.
    pub fn create_writer(
        &self,
        slot: usize,
        buf_size: Option<usize>,
    ) -> Result<SlotWriter<io::BufWriter<fs::File>>, SlotError> {
        let file = fs::File::create(self.path(slot)).map_err(|err| SlotError::new(slot, err))?;
        let writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        return Ok(SlotWriter::new(slot, writer));
    }

    /// Removes the working directory reporting removal errors.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Reads integers stored one per line from a working slot.
pub struct SlotReader<R> {
    slot: usize,
    reader: R,
    line: String,
    eof: bool,
}

impl<R: BufRead> SlotReader<R> {
    pub fn new(slot: usize, reader: R) -> Self {
        SlotReader {
            slot,
            reader,
            line: String::new(),
            eof: false,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the next value or [`None`] if the slot is exhausted.
    pub fn next_value(&mut self) -> Result<Option<i64>, SlotError> {
        if self.eof {
            return Ok(None);
        }

        self.line.clear();
        let bytes = self
            .reader
            .read_line(&mut self.line)
            .map_err(|err| SlotError::new(self.slot, err))?;
        if bytes == 0 {
            self.eof = true;
            return Ok(None);
        }

        let value = self.line.trim();
        match value.parse::<i64>() {
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(SlotError::new(
                self.slot,
                io::Error::new(io::ErrorKind::InvalidData, format!("corrupted value {:?}: {}", value, err)),
            )),
        }
    }
}

/// Writes integers one per line to a working slot.
pub struct SlotWriter<W: Write> {
    slot: usize,
    writer: W,
    written: usize,
}

impl<W: Write> SlotWriter<W> {
    pub fn new(slot: usize, writer: W) -> Self {
        SlotWriter {
            slot,
            writer,
            written: 0,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the number of values written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_value(&mut self, value: i64) -> Result<(), SlotError> {
        writeln!(self.writer, "{}", value).map_err(|err| SlotError::new(self.slot, err))?;
        self.written += 1;

        return Ok(());
    }

    /// Flushes buffered values. Must be called before the slot is read back,
    /// dropping a writer flushes it too but silently ignores errors.
    pub fn finish(&mut self) -> Result<(), SlotError> {
        self.writer.flush().map_err(|err| SlotError::new(self.slot, err))
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::{SlotReader, SlotWriter, WorkingSlots, SLOT_COUNT};

    #[fixture]
    fn slots() -> WorkingSlots {
        WorkingSlots::new(None).unwrap()
    }

    #[rstest]
    fn test_slot_write_read(slots: WorkingSlots) {
        let saved = vec![-3, 0, 7, 7, i64::MAX, i64::MIN];

        let mut writer = slots.create_writer(2, None).unwrap();
        for value in saved.iter() {
            writer.write_value(*value).unwrap();
        }
        writer.finish().unwrap();
        assert_eq!(writer.written(), saved.len());

        let mut reader = slots.open_reader(2, Some(16)).unwrap();
        let mut restored = Vec::new();
        while let Some(value) = reader.next_value().unwrap() {
            restored.push(value);
        }

        assert_eq!(restored, saved);
        assert_eq!(reader.next_value().unwrap(), None);
    }

    #[rstest]
    fn test_slot_paths_are_distinct(slots: WorkingSlots) {
        for slot in 0..SLOT_COUNT {
            assert!(slots.path(slot).starts_with(slots.dir()));
            for other in (slot + 1)..SLOT_COUNT {
                assert_ne!(slots.path(slot), slots.path(other));
            }
        }
    }

    #[rstest]
    fn test_missing_slot(slots: WorkingSlots) {
        let err = slots.open_reader(3, None).err().unwrap();
        assert_eq!(err.slot, 3);
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn test_close_removes_directory(slots: WorkingSlots) {
        let mut writer = slots.create_writer(0, None).unwrap();
        writer.write_value(1).unwrap();
        writer.finish().unwrap();
        drop(writer);

        let dir = slots.dir().to_path_buf();
        assert!(dir.exists());
        slots.close().unwrap();
        assert!(fs::metadata(dir).is_err());
    }

    #[test]
    fn test_corrupted_slot() {
        let mut reader = SlotReader::new(1, io::Cursor::new("5\nfive\n"));

        assert_eq!(reader.next_value().unwrap(), Some(5));
        let err = reader.next_value().err().unwrap();
        assert_eq!(err.slot, 1);
        assert_eq!(err.source.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_writer_format() {
        let mut writer = SlotWriter::new(0, Vec::new());
        writer.write_value(10).unwrap();
        writer.write_value(-1).unwrap();
        writer.finish().unwrap();

        assert_eq!(String::from_utf8(writer.writer).unwrap(), "10\n-1\n");
    }
}
