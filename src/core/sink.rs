//! Result sinks
//!
//! Result lines are streamed to a [`ResultSink`] as they are found, so the
//! whole result set is never held in memory. Standard output gets one line
//! per result; an output file gets the lines joined by `\n` with no trailing
//! newline, written through a temporary sibling file that replaces the
//! destination only once the scan has finished.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::error::ScanError;

/// Where result lines end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => OutputTarget::File(p),
            None => OutputTarget::Stdout,
        }
    }
}

/// Append-only destination for result lines
pub trait ResultSink {
    /// Append one result line
    fn write_line(&mut self, line: &str) -> Result<(), ScanError>;

    /// Flush and commit everything written so far
    fn finish(&mut self) -> Result<(), ScanError>;
}

/// Writes each line followed by `\n` to any writer (stdout in practice)
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), ScanError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(ScanError::StdoutWrite)
    }

    fn finish(&mut self) -> Result<(), ScanError> {
        self.writer.flush().map_err(ScanError::StdoutWrite)
    }
}

/// Buffered, locked standard output
pub fn stdout_sink() -> WriterSink<BufWriter<std::io::StdoutLock<'static>>> {
    WriterSink::new(BufWriter::new(std::io::stdout().lock()))
}

/// Streams newline-joined lines into a temp file, renamed over the
/// destination on [`ResultSink::finish`]. Dropping an unfinished sink
/// removes the temp file and leaves the destination untouched.
///
/// An existing destination is resolved through symlinks first, and its
/// permissions carry over to the new file.
pub struct FileSink {
    destination: PathBuf,
    temp_path: PathBuf,
    writer: Option<BufWriter<File>>,
    wrote_any: bool,
}

impl FileSink {
    pub fn create(destination: &Path) -> Result<Self, ScanError> {
        let existing = fs::metadata(destination).ok();
        let destination = match existing {
            Some(_) => {
                fs::canonicalize(destination).unwrap_or_else(|_| destination.to_path_buf())
            }
            None => destination.to_path_buf(),
        };

        let temp_path = temp_path_for(&destination);
        let file =
            File::create(&temp_path).map_err(|e| ScanError::output_write(&destination, e))?;
        if let Some(meta) = existing {
            if let Err(e) = file.set_permissions(meta.permissions()) {
                let _ = fs::remove_file(&temp_path);
                return Err(ScanError::output_write(&destination, e));
            }
        }

        Ok(Self {
            destination,
            temp_path,
            writer: Some(BufWriter::new(file)),
            wrote_any: false,
        })
    }

    /// The in-progress file, which a scan must not read back
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn write_error(&self, e: std::io::Error) -> ScanError {
        ScanError::output_write(&self.destination, e)
    }
}

impl ResultSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<(), ScanError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(self.write_error(std::io::Error::other("output already finished")));
        };

        let result = if self.wrote_any {
            writer
                .write_all(b"\n")
                .and_then(|_| writer.write_all(line.as_bytes()))
        } else {
            writer.write_all(line.as_bytes())
        };
        self.wrote_any = true;
        result.map_err(|e| self.write_error(e))
    }

    fn finish(&mut self) -> Result<(), ScanError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };

        let result = self.commit(writer);
        if result.is_err() {
            let _ = fs::remove_file(&self.temp_path);
        }
        result
    }
}

impl FileSink {
    fn commit(&self, writer: BufWriter<File>) -> Result<(), ScanError> {
        let file = writer
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        file.sync_all().map_err(|e| self.write_error(e))?;
        drop(file);

        fs::rename(&self.temp_path, &self.destination).map_err(|e| self.write_error(e))
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// `dir/.name.<pid>.tmp` next to the destination
fn temp_path_for(destination: &Path) -> PathBuf {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    dir.join(format!(".{}.{}.tmp", name, std::process::id()))
}
