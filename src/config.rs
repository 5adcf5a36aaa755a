//! Configuration builders controlling corpus preparation and input loading.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Fixed width used to store each code in the token files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodeWidth {
    /// Unsigned 16-bit little-endian codes.
    #[default]
    U16,
    /// Unsigned 32-bit little-endian codes.
    U32,
}

impl CodeWidth {
    /// Number of bytes occupied by a single code.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Number of distinct codes representable at this width.
    #[must_use]
    pub fn capacity(self) -> usize {
        match self {
            Self::U16 => 1 << 16,
            Self::U32 => usize::try_from(1u64 << 32).unwrap_or(usize::MAX),
        }
    }

    /// Fails with [`PrepError::VocabOverflow`] when `vocab_size` codes do not fit.
    pub fn check_capacity(self, vocab_size: usize) -> Result<()> {
        let capacity = self.capacity();
        if vocab_size > capacity {
            return Err(PrepError::VocabOverflow {
                vocab_size,
                capacity,
            });
        }
        Ok(())
    }
}

impl fmt::Display for CodeWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::U16 => "u16",
            Self::U32 => "u32",
        };
        f.write_str(label)
    }
}

/// How raw text is turned into the text that gets encoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// Isolate the `<text>` payload and strip wiki markup noise.
    #[default]
    Wiki,
    /// Encode the decoded dump verbatim.
    Raw,
}

/// File names written into the output directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Token file holding the training prefix.
    pub train_file: String,
    /// Token file holding the validation suffix.
    pub val_file: String,
    /// JSON side file describing the vocabulary.
    pub meta_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            train_file: "train.bin".into(),
            val_file: "val.bin".into(),
            meta_file: "meta.json".into(),
        }
    }
}

impl OutputConfig {
    /// Validates that every name is a plain, non-empty file name and that names are distinct.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("train_file", &self.train_file),
            ("val_file", &self.val_file),
            ("meta_file", &self.meta_file),
        ];
        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(PrepError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
            let path = Path::new(name.as_str());
            if path.file_name().map(|f| f != path.as_os_str()).unwrap_or(true) {
                return Err(PrepError::InvalidConfig(format!(
                    "{field} ({name:?}) must be a plain file name"
                )));
            }
        }
        if self.train_file == self.val_file
            || self.train_file == self.meta_file
            || self.val_file == self.meta_file
        {
            return Err(PrepError::InvalidConfig(
                "output file names must be distinct".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a corpus preparation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Fraction of the encoded sequence placed in the training split.
    pub train_ratio: f64,
    /// Width of each code in the token files.
    pub code_width: CodeWidth,
    /// Selects markup stripping or verbatim encoding.
    pub normalization: NormalizationMode,
    /// Enables per-stage logging through the `log` facade.
    pub show_progress: bool,
    /// Names of the files written by the run.
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Returns a builder initialised with [`PipelineConfig::default`].
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Validates the invariants required for a run.
    pub fn validate(&self) -> Result<()> {
        if !self.train_ratio.is_finite() || !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(PrepError::InvalidConfig(format!(
                "train_ratio ({}) must lie within [0, 1]",
                self.train_ratio
            )));
        }
        self.output.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.9,
            code_width: CodeWidth::default(),
            normalization: NormalizationMode::default(),
            show_progress: true,
            output: OutputConfig::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default, Clone)]
pub struct PipelineBuilder {
    cfg: PipelineConfig,
}

impl PipelineBuilder {
    /// Creates a builder with [`PipelineConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fraction of codes assigned to the training split.
    #[must_use]
    pub fn train_ratio(mut self, value: f64) -> Self {
        self.cfg.train_ratio = value;
        self
    }

    /// Sets the on-disk code width.
    #[must_use]
    pub fn code_width(mut self, value: CodeWidth) -> Self {
        self.cfg.code_width = value;
        self
    }

    /// Selects the normalization mode.
    #[must_use]
    pub fn normalization(mut self, value: NormalizationMode) -> Self {
        self.cfg.normalization = value;
        self
    }

    /// Enables or disables per-stage logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Overrides the output file names.
    #[must_use]
    pub fn output(mut self, value: OutputConfig) -> Self {
        self.cfg.output = value;
        self
    }

    /// Finalises the builder, returning a validated [`PipelineConfig`].
    pub fn build(self) -> Result<PipelineConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Compression applied to the raw dump on disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Pick bzip2 for `.bz2` files, zip for `.zip` files and plain reads otherwise.
    #[default]
    Auto,
    /// Read the file as-is.
    None,
    /// Decompress a (possibly multi-stream) bzip2 file.
    Bzip2,
    /// Extract one member of a zip archive.
    Zip,
}

/// Configuration controlling how the raw dump is read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InputConfig {
    /// Compression of the input file.
    pub compression: Compression,
    /// Archive member to extract from a zip input. When unset the archive
    /// must hold exactly one file.
    #[serde(default)]
    pub member: Option<String>,
}

impl InputConfig {
    /// Resolves [`Compression::Auto`] against the input path.
    #[must_use]
    pub fn resolve_compression(&self, path: &Path) -> Compression {
        match self.compression {
            Compression::Auto => {
                let ext = path.extension().and_then(|ext| ext.to_str());
                match ext {
                    Some(ext) if ext.eq_ignore_ascii_case("bz2") => Compression::Bzip2,
                    Some(ext) if ext.eq_ignore_ascii_case("zip") => Compression::Zip,
                    _ => Compression::None,
                }
            }
            other => other,
        }
    }
}
