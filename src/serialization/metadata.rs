//! JSON side file describing the vocabulary used by the token files.
//!
//! The record carries `vocab_size`, the code→character map `itos`, the
//! character→code map `stoi`, and the `code_width` of the token files. Maps are
//! ordered so identical vocabularies always produce identical bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::CodeWidth;
use crate::error::{PrepError, Result};
use crate::vocab::{Code, Vocabulary};

/// On-disk metadata record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    /// Number of characters in the vocabulary.
    pub vocab_size: usize,
    /// Code to character mapping.
    pub itos: BTreeMap<Code, char>,
    /// Character to code mapping.
    pub stoi: BTreeMap<char, Code>,
    /// Width of every code in the accompanying token files.
    #[serde(default)]
    pub code_width: CodeWidth,
}

impl Metadata {
    /// Captures both directions of `vocab`.
    #[must_use]
    pub fn new(vocab: &Vocabulary, code_width: CodeWidth) -> Self {
        let itos = vocab
            .chars()
            .iter()
            .enumerate()
            .map(|(code, &ch)| (code as Code, ch))
            .collect();
        let stoi = vocab
            .chars()
            .iter()
            .enumerate()
            .map(|(code, &ch)| (ch, code as Code))
            .collect();
        Self {
            vocab_size: vocab.len(),
            itos,
            stoi,
            code_width,
        }
    }

    /// Rebuilds the vocabulary, checking that every field agrees with the others.
    pub fn to_vocabulary(&self) -> Result<Vocabulary> {
        if self.itos.len() != self.vocab_size || self.stoi.len() != self.vocab_size {
            return Err(PrepError::Serialization(format!(
                "vocab_size {} disagrees with itos ({} entries) or stoi ({} entries)",
                self.vocab_size,
                self.itos.len(),
                self.stoi.len()
            )));
        }
        let mut chars = Vec::with_capacity(self.vocab_size);
        for (expected, (&code, &ch)) in self.itos.iter().enumerate() {
            if code as usize != expected {
                return Err(PrepError::Serialization(format!(
                    "itos codes must be dense from 0, found {code} at index {expected}"
                )));
            }
            if self.stoi.get(&ch) != Some(&code) {
                return Err(PrepError::Serialization(format!(
                    "stoi does not map {ch:?} back to code {code}"
                )));
            }
            chars.push(ch);
        }
        Vocabulary::from_chars(chars)
    }
}

/// Serialises the metadata record for `vocab` as pretty-printed JSON.
pub fn serialize_metadata(vocab: &Vocabulary, code_width: CodeWidth) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(&Metadata::new(vocab, code_width))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses and validates a record produced by [`serialize_metadata`].
pub fn deserialize_metadata(bytes: &[u8]) -> Result<(Vocabulary, CodeWidth)> {
    let metadata: Metadata = serde_json::from_slice(bytes)?;
    let vocab = metadata.to_vocabulary()?;
    Ok((vocab, metadata.code_width))
}

/// Reads and validates a metadata file from disk.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<(Vocabulary, CodeWidth)> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    deserialize_metadata(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn record_has_expected_fields() {
        let vocab = Vocabulary::from_text("ba\n");
        let bytes = serialize_metadata(&vocab, CodeWidth::U16).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["vocab_size"], 3);
        assert_eq!(value["itos"]["0"], "\n");
        assert_eq!(value["itos"]["2"], "b");
        assert_eq!(value["stoi"]["a"], 1);
        assert_eq!(value["code_width"], "u16");
    }

    #[test]
    fn deserialisation_rebuilds_identical_vocabulary() {
        let vocab = Vocabulary::from_text("Hello Earth\u{0}\u{FF}\"\\");
        let bytes = serialize_metadata(&vocab, CodeWidth::U32).unwrap();
        let (restored, width) = deserialize_metadata(&bytes).unwrap();
        assert_eq!(restored, vocab);
        assert_eq!(width, CodeWidth::U32);
    }

    #[test]
    fn empty_vocabulary_is_valid() {
        let bytes = serialize_metadata(&Vocabulary::default(), CodeWidth::U16).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["vocab_size"], 0);
        assert!(value["itos"].as_object().unwrap().is_empty());
        let (restored, _) = deserialize_metadata(&bytes).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn serialisation_is_byte_stable() {
        let first = serialize_metadata(&Vocabulary::from_text("zyxabc"), CodeWidth::U16).unwrap();
        let second = serialize_metadata(&Vocabulary::from_text("cbaxyz"), CodeWidth::U16).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_code_width_defaults_to_u16() {
        let json = br#"{"vocab_size": 1, "itos": {"0": "a"}, "stoi": {"a": 0}}"#;
        let (vocab, width) = deserialize_metadata(json).unwrap();
        assert_eq!(vocab.alphabet(), "a");
        assert_eq!(width, CodeWidth::U16);
    }

    #[test]
    fn inconsistent_records_are_rejected() {
        let cases: [&[u8]; 4] = [
            br#"{"vocab_size": 2, "itos": {"0": "a"}, "stoi": {"a": 0}}"#,
            br#"{"vocab_size": 1, "itos": {"1": "a"}, "stoi": {"a": 1}}"#,
            br#"{"vocab_size": 1, "itos": {"0": "a"}, "stoi": {"b": 0}}"#,
            br#"{"vocab_size": 2, "itos": {"0": "b", "1": "a"}, "stoi": {"a": 1, "b": 0}}"#,
        ];
        for json in cases {
            let err = deserialize_metadata(json).expect_err("should fail");
            assert!(matches!(err, PrepError::Serialization(_)), "{err}");
        }
    }
}
