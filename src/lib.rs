//! Character-level corpus preparation library and CLI.
//!
//! The crate turns a raw wiki dump into the files a character-level language
//! model trains on: every byte is read as one character, wiki markup noise is
//! stripped, the distinct characters form a sorted vocabulary, and the encoded
//! text is split 90/10 into `train.bin` and `val.bin` (16-bit little-endian codes)
//! with the vocabulary stored next to them in `meta.json`.
//!
//! ```no_run
//! use charprep::{InputConfig, Pipeline, PipelineConfig};
//!
//! # fn main() -> charprep::Result<()> {
//! let cfg = PipelineConfig::builder()
//!     .train_ratio(0.9)
//!     .show_progress(false)
//!     .build()?;
//! let pipeline = Pipeline::new(cfg);
//! let (artifacts, paths) = pipeline.run("enwik8", &InputConfig::default(), "data")?;
//! println!("vocab {} -> {}", artifacts.corpus.vocab.len(), paths.meta.display());
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `charprep = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

pub mod bytes;
pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod serialization;
pub mod split;
pub mod vocab;

pub use config::{
    CodeWidth, Compression, InputConfig, NormalizationMode, OutputConfig, PipelineBuilder,
    PipelineConfig,
};
pub use error::{PrepError, Result};
pub use metrics::{PipelineMetrics, Stage, StageMetrics};
pub use pipeline::{OutputPaths, Pipeline, PipelineArtifacts, PreparedCorpus};
pub use vocab::{Code, Vocabulary};
