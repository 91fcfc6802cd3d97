//! Append-only cue log writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use socialcue_common::error::{SocialCueError, SocialCueResult};
use socialcue_scene_model::cue_log::{CueLogHeader, CueRecord};

/// Records between automatic flushes.
const FLUSH_EVERY: u64 = 500;

/// Writes cue records to a JSONL file, header first.
pub struct CueLogWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl CueLogWriter {
    /// Create (or truncate) the log and write the `#` header line.
    pub fn create(path: impl Into<PathBuf>, header: &CueLogHeader) -> SocialCueResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}").map_err(|e| {
            SocialCueError::simulation(format!("Failed to write cue log header: {e}"))
        })?;

        tracing::debug!(path = %path.display(), "Cue log opened");
        Ok(Self {
            writer,
            path,
            records_written: 0,
        })
    }

    pub fn write(&mut self, record: &CueRecord) -> SocialCueResult<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| SocialCueError::simulation(format!("Failed to write cue record: {e}")))?;
        self.records_written += 1;

        if self.records_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn write_records<'r>(
        &mut self,
        records: impl IntoIterator<Item = &'r CueRecord>,
    ) -> SocialCueResult<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> SocialCueResult<()> {
        self.writer
            .flush()
            .map_err(|e| SocialCueError::simulation(format!("Failed to flush cue log: {e}")))
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CueLogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
