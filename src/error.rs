use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The input does not follow the Cachegrind block grammar.
///
/// Line numbers are 1-based and count from the start of the whole input, so they can be used
/// directly to locate the problem in the profile file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A line did not start with the prefix the grammar requires at that point.
    #[error("parse error on line {line}: expected `{expected}`, found `{found}`")]
    UnexpectedLine {
        /// Where the offending line is.
        line: usize,
        /// The prefix that was expected.
        expected: &'static str,
        /// The offending line.
        found: String,
    },

    /// The input ended in the middle of a block.
    #[error("parse error on line {line}: input ended while expecting `{expected}`")]
    UnexpectedEof {
        /// The line that would have been read next.
        line: usize,
        /// What the grammar required there.
        expected: &'static str,
    },

    /// A cost, summary or `calls=` line held something other than the expected numbers.
    #[error("parse error on line {line}: invalid number in `{found}`")]
    InvalidNumber {
        /// Where the offending line is.
        line: usize,
        /// The offending line.
        found: String,
    },

    /// A function declared more calls than there are records left to attach as its children.
    #[error("truncated profile: `{function}` is still missing {missing} call(s)")]
    MissingChildren {
        /// The function whose calls could not all be found.
        function: String,
        /// How many calls are unaccounted for.
        missing: u64,
    },
}

/// Everything that can make a conversion fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The profile is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The requested configuration cannot be satisfied.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// The file in question.
        path: PathBuf,
        /// Why it failed.
        source: io::Error,
    },

    /// Writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The XML writer failed.
    #[error("failed to write XML: {0}")]
    Render(#[from] quick_xml::Error),

    /// The external `dot` command failed.
    #[error("failed executing dot: {0}")]
    Dot(String),
}

impl Error {
    /// The process exit code for this class of failure.
    ///
    /// Configuration problems share clap's code for argument errors so that every kind of bad
    /// invocation looks the same to scripts.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::File { .. } | Error::Io(_) => 3,
            Error::Format(_) => 4,
            Error::Render(_) | Error::Dot(_) => 5,
        }
    }
}
