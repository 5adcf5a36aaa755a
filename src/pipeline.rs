//! End-to-end preparation: decode → normalize → vocabulary → encode → split → serialize.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use crate::bytes::{bytes_to_text, display_char};
use crate::config::{
    CodeWidth, InputConfig, NormalizationMode, OutputConfig, PipelineBuilder, PipelineConfig,
};
use crate::corpus::load_raw_dump;
use crate::error::{PrepError, Result};
use crate::metrics::{PipelineMetrics, Stage};
use crate::normalize::normalize;
use crate::serialization::{
    deserialize_tokens, load_metadata, serialize_metadata, serialize_tokens, write_atomic,
};
use crate::split::split;
use crate::vocab::{Code, Vocabulary};

/// High-level façade configuring and executing preparation runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    cfg: PipelineConfig,
}

/// Encoded corpus held in memory, ready to be written or inspected.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCorpus {
    /// Vocabulary the codes refer to.
    pub vocab: Vocabulary,
    /// Training prefix of the encoded sequence.
    pub train: Vec<Code>,
    /// Validation suffix of the encoded sequence.
    pub val: Vec<Code>,
    /// Width used when the codes are written to disk.
    pub code_width: CodeWidth,
}

/// Artifacts returned after a preparation run completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    /// Encoded corpus and its vocabulary.
    pub corpus: PreparedCorpus,
    /// Detailed metrics captured during the run.
    pub metrics: PipelineMetrics,
}

/// Locations of the files written for a prepared corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Training token file.
    pub train: PathBuf,
    /// Validation token file.
    pub val: PathBuf,
    /// Metadata side file.
    pub meta: PathBuf,
}

impl OutputPaths {
    /// Joins the configured file names onto `dir`.
    #[must_use]
    pub fn resolve(dir: &Path, output: &OutputConfig) -> Self {
        Self {
            train: dir.join(&output.train_file),
            val: dir.join(&output.val_file),
            meta: dir.join(&output.meta_file),
        }
    }
}

impl Pipeline {
    /// Creates a new pipeline for the supplied configuration.
    #[must_use]
    pub fn new(cfg: PipelineConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`PipelineBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Loads the dump at `input`, prepares it, and writes the output files into `output_dir`.
    ///
    /// Every stage runs in memory before the first file is written, so data and
    /// configuration errors leave `output_dir` untouched.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        ingest: &InputConfig,
        output_dir: Q,
    ) -> Result<(PipelineArtifacts, OutputPaths)> {
        let mut artifacts = self.prepare_from_path(input, ingest)?;
        let paths = artifacts.write_to_dir(output_dir, &self.cfg.output)?;
        Ok((artifacts, paths))
    }

    /// Loads the dump at `input` and prepares it in memory.
    pub fn prepare_from_path<P: AsRef<Path>>(
        &self,
        input: P,
        ingest: &InputConfig,
    ) -> Result<PipelineArtifacts> {
        let raw = load_raw_dump(input, ingest)?;
        self.prepare_from_bytes(&raw)
    }

    /// Prepares an in-memory dump.
    pub fn prepare_from_bytes(&self, raw: &[u8]) -> Result<PipelineArtifacts> {
        self.cfg.validate()?;
        let run_start = Instant::now();
        let mut metrics = PipelineMetrics::new();

        let started = Instant::now();
        let raw_text = bytes_to_text(raw);
        metrics.record(Stage::Decode, raw.len(), started);

        let started = Instant::now();
        let text = match self.cfg.normalization {
            NormalizationMode::Wiki => normalize(&raw_text)?,
            NormalizationMode::Raw => raw_text,
        };
        let text_len = text.chars().count();
        metrics.record(Stage::Normalize, text_len, started);
        if self.cfg.show_progress {
            info!("length of dataset in characters: {text_len}");
        }
        if text_len == 0 {
            warn!("normalized corpus is empty; writing an empty vocabulary");
        }

        let started = Instant::now();
        let vocab = Vocabulary::from_text(&text);
        self.cfg.code_width.check_capacity(vocab.len())?;
        metrics.record(Stage::Vocabulary, vocab.len(), started);
        if self.cfg.show_progress {
            let listing: String = vocab.chars().iter().map(|&ch| display_char(ch)).collect();
            info!("all the unique characters: {listing}");
            info!("vocab size: {}", vocab.len());
        }

        let started = Instant::now();
        let encoded = vocab.encode(&text)?;
        drop(text);
        metrics.record(Stage::Encode, encoded.len(), started);

        let started = Instant::now();
        let (train, val) = split(&encoded, self.cfg.train_ratio);
        let (train, val) = (train.to_vec(), val.to_vec());
        drop(encoded);
        metrics.record(Stage::Split, train.len() + val.len(), started);
        if self.cfg.show_progress {
            info!("train has {} tokens", train.len());
            info!("val has {} tokens", val.len());
        }
        if val.is_empty() && !train.is_empty() {
            warn!("validation split is empty; consider a smaller train ratio");
        }

        metrics.total_duration = run_start.elapsed();
        Ok(PipelineArtifacts {
            corpus: PreparedCorpus {
                vocab,
                train,
                val,
                code_width: self.cfg.code_width,
            },
            metrics,
        })
    }
}

impl PipelineArtifacts {
    /// Writes the corpus into `dir`, recording the serialisation stage in the metrics.
    pub fn write_to_dir<P: AsRef<Path>>(
        &mut self,
        dir: P,
        output: &OutputConfig,
    ) -> Result<OutputPaths> {
        let started = Instant::now();
        let (paths, written) = self.corpus.write_to_dir(dir, output)?;
        self.metrics.record(Stage::Serialize, written, started);
        self.metrics.total_duration += started.elapsed();
        Ok(paths)
    }
}

impl PreparedCorpus {
    /// Total number of encoded characters across both splits.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    /// Serialises all three files and then writes each one atomically.
    ///
    /// Returns the resolved paths and the total number of bytes written.
    pub fn write_to_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        output: &OutputConfig,
    ) -> Result<(OutputPaths, usize)> {
        output.validate()?;
        self.code_width.check_capacity(self.vocab.len())?;
        let train = serialize_tokens(&self.train, self.code_width)?;
        let val = serialize_tokens(&self.val, self.code_width)?;
        let meta = serialize_metadata(&self.vocab, self.code_width)?;

        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|err| PrepError::io(err, Some(dir.to_path_buf())))?;
        let paths = OutputPaths::resolve(dir, output);
        write_atomic(&paths.train, &train)?;
        write_atomic(&paths.val, &val)?;
        write_atomic(&paths.meta, &meta)?;
        Ok((paths, train.len() + val.len() + meta.len()))
    }

    /// Reads a corpus previously written with [`PreparedCorpus::write_to_dir`].
    ///
    /// Every code is checked against the vocabulary from the metadata file.
    pub fn load<P: AsRef<Path>>(dir: P, output: &OutputConfig) -> Result<Self> {
        let paths = OutputPaths::resolve(dir.as_ref(), output);
        let (vocab, code_width) = load_metadata(&paths.meta)?;
        let train = load_token_file(&paths.train, code_width, &vocab)?;
        let val = load_token_file(&paths.val, code_width, &vocab)?;
        Ok(Self {
            vocab,
            train,
            val,
            code_width,
        })
    }

    /// Decodes both splits back into one text.
    pub fn decode(&self) -> Result<String> {
        let mut text = self.vocab.decode(&self.train)?;
        text.push_str(&self.vocab.decode(&self.val)?);
        Ok(text)
    }
}

/// Reads a token file and checks every code against `vocab`.
pub fn load_token_file(
    path: &Path,
    code_width: CodeWidth,
    vocab: &Vocabulary,
) -> Result<Vec<Code>> {
    let bytes = fs::read(path).map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    let codes = deserialize_tokens(&bytes, code_width)?;
    if let Some((position, &code)) = codes
        .iter()
        .enumerate()
        .find(|&(_, &code)| code as usize >= vocab.len())
    {
        return Err(PrepError::InvalidCode {
            code,
            position,
            vocab_size: vocab.len(),
        });
    }
    Ok(codes)
}

impl fmt::Display for PipelineArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Character corpus with vocab size {}", self.corpus.vocab.len())?;
        writeln!(
            f,
            "Tokens: {} train / {} val",
            self.corpus.train.len(),
            self.corpus.val.len()
        )?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
