//! The output directory and its transcripts.
//!
//! One flat directory, wiped at session start. Every attempt writes
//! `test.log.{attempt}` incrementally; retained attempts get the statement
//! header prepended, discarded ones are deleted. Surviving file names are
//! therefore not contiguous.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sieve_signal::{ConformanceStatement, LogRecord};

use crate::testcase::{render_header, TestCase};

/// File name prefix; the attempt index follows.
pub const TRANSCRIPT_PREFIX: &str = "test.log.";

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("output path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("no test case for attempt {0}")]
    Missing(u64),
}

/// A surviving test case file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusEntry {
    pub attempt: u64,
    pub path: PathBuf,
}

/// The transcript file of one in-flight attempt.
#[derive(Debug)]
pub struct Transcript {
    attempt: u64,
    path: PathBuf,
    writer: BufWriter<File>,
    lines: usize,
}

impl Transcript {
    /// Append one record as a transcript line.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), CorpusError> {
        writeln!(self.writer, "{}", record.render())?;
        self.lines += 1;
        Ok(())
    }

    pub fn append_all(&mut self, records: &[LogRecord]) -> Result<(), CorpusError> {
        for record in records {
            self.append(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written so far.
    pub fn len(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

/// Owner of the output directory.
#[derive(Debug, Clone)]
pub struct TestCorpus {
    dir: PathBuf,
}

impl TestCorpus {
    /// Wipe `dir` and recreate it empty.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, CorpusError> {
        let dir = dir.into();
        if dir.exists() {
            if !dir.is_dir() {
                return Err(CorpusError::NotADirectory(dir));
            }
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        tracing::debug!("Output directory {} recreated", dir.display());
        Ok(Self { dir })
    }

    /// Open an existing corpus without touching it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CorpusError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(CorpusError::NotADirectory(dir));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, attempt: u64) -> PathBuf {
        self.dir.join(format!("{}{}", TRANSCRIPT_PREFIX, attempt))
    }

    /// Start the transcript for an attempt.
    pub fn begin(&self, attempt: u64) -> Result<Transcript, CorpusError> {
        let path = self.path_for(attempt);
        let file = File::create(&path)?;
        Ok(Transcript {
            attempt,
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Keep the attempt: rewrite its file with the statement header prepended.
    pub fn persist<'a, I>(&self, transcript: Transcript, statements: I) -> Result<PathBuf, CorpusError>
    where
        I: IntoIterator<Item = &'a ConformanceStatement>,
    {
        let Transcript {
            path, mut writer, ..
        } = transcript;
        writer.flush()?;
        drop(writer);

        let body = fs::read_to_string(&path)?;
        let mut contents = render_header(statements);
        contents.push_str(&body);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Drop the attempt: delete its file.
    pub fn discard(&self, transcript: Transcript) -> Result<(), CorpusError> {
        let Transcript { path, writer, .. } = transcript;
        drop(writer);
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Surviving test cases, ordered by attempt index.
    pub fn entries(&self) -> Result<Vec<CorpusEntry>, CorpusError> {
        let mut entries = Vec::new();
        for item in fs::read_dir(&self.dir)? {
            let path = item?.path();
            let attempt = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(TRANSCRIPT_PREFIX))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(attempt) = attempt {
                entries.push(CorpusEntry { attempt, path });
            }
        }
        entries.sort_by_key(|e| e.attempt);
        Ok(entries)
    }

    /// Read back the test case stored for an attempt.
    pub fn load(&self, attempt: u64) -> Result<TestCase, CorpusError> {
        let path = self.path_for(attempt);
        if !path.is_file() {
            return Err(CorpusError::Missing(attempt));
        }
        TestCase::load(&path)
    }
}
