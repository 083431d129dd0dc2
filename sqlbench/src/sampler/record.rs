use sqlbench_core::{SampleRecord, SAMPLE_RECORD_HEADER};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

/// Append-only CSV record of watchdog samples.
pub struct SampleRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SampleRecorder {
    pub fn file_name(started: OffsetDateTime) -> String {
        let format = format_description!("[year]-[month]-[day]_[hour]_[minute]_[second]");
        let stamp = started.format(&format).unwrap_or_default();
        format!("BenchmarkReport-{stamp}.csv")
    }

    /// Open (or create) the record for a run started at `started`.
    pub fn create(dir: &Path, started: OffsetDateTime) -> io::Result<Self> {
        Self::open(dir.join(Self::file_name(started)))
    }

    /// Open `path` for appending. The header is only written into a fresh, empty file.
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let metadata = file.metadata()?;

        let mut writer = BufWriter::new(file);
        if metadata.is_file() && metadata.len() == 0 {
            writeln!(writer, "{SAMPLE_RECORD_HEADER}")?;
            writer.flush()?;
        }

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, sample: &SampleRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", sample.csv_line())?;
        self.writer.flush()
    }
}
