//! The persisted test case format.
//!
//! Plain text: the distinct conformance statements, one per line, followed
//! by the verbatim transcript. Transcript lines start with a zero-padded
//! arrival position and a space; every line before the first of them is a
//! statement, whatever its prefix.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use sieve_signal::ConformanceStatement;

use crate::corpus::CorpusError;

/// A retained interaction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Distinct statements exercised, in header order.
    pub statements: Vec<ConformanceStatement>,
    /// Rendered transcript lines in emission order.
    pub transcript: Vec<String>,
}

impl TestCase {
    /// Split a persisted file into header and transcript.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().peekable();
        let mut statements = Vec::new();
        while let Some(line) = lines.next_if(|l| !is_transcript_line(l)) {
            statements.push(ConformanceStatement::new(line));
        }
        Self {
            statements,
            transcript: lines.map(str::to_string).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Render back to the on-disk form.
    pub fn render(&self) -> String {
        let mut out = render_header(&self.statements);
        for line in &self.transcript {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// A rendered record: at least six position digits, then a space.
pub fn is_transcript_line(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits >= 6 && line.as_bytes().get(digits) == Some(&b' ')
}

/// Deduplicated, ordered header lines. Statement text is written verbatim
/// except that line breaks become spaces; blank identifiers are skipped.
pub(crate) fn render_header<'a, I>(statements: I) -> String
where
    I: IntoIterator<Item = &'a ConformanceStatement>,
{
    let distinct: BTreeSet<String> = statements
        .into_iter()
        .filter(|s| !s.as_str().trim().is_empty())
        .map(|s| {
            let text = s.as_str();
            if text.contains(['\r', '\n']) {
                text.replace(['\r', '\n'], " ")
            } else {
                text.to_string()
            }
        })
        .collect();

    let mut out = String::new();
    for line in distinct {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
