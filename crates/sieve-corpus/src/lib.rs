pub mod corpus;
pub mod testcase;

pub use corpus::{CorpusEntry, CorpusError, TestCorpus, Transcript, TRANSCRIPT_PREFIX};
pub use testcase::{is_transcript_line, TestCase};
