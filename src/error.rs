//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = PrepError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while preparing or loading a corpus.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Pipeline configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The vocabulary does not fit into the configured fixed-width code.
    #[error("vocab size {vocab_size} exceeds the {capacity} codes representable by the token width")]
    VocabOverflow {
        /// Number of distinct characters in the vocabulary.
        vocab_size: usize,
        /// Number of distinct codes the configured width can hold.
        capacity: usize,
    },
    /// The raw dump does not contain the expected payload markers.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A character was encoded that the vocabulary does not know about.
    #[error("unknown symbol {symbol:?} (U+{:04X}) at position {position}", code_point(.symbol))]
    UnknownSymbol {
        /// Offending character.
        symbol: char,
        /// Character offset within the encoded text.
        position: usize,
    },
    /// A code was decoded that lies outside `[0, vocab_size)`.
    #[error("invalid code {code} at position {position} for vocab size {vocab_size}")]
    InvalidCode {
        /// Offending code.
        code: u32,
        /// Offset within the decoded sequence.
        position: usize,
        /// Size of the vocabulary used for decoding.
        vocab_size: usize,
    },
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn code_point(symbol: &char) -> u32 {
    u32::from(*symbol)
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl PrepError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` for errors caused by configuration rather than data.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::VocabOverflow { .. })
    }
}
