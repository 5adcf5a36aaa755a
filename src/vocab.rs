//! Character vocabulary with a dense, ordered code assignment.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::error::{PrepError, Result};

/// Integer code assigned to a character.
pub type Code = u32;

/// Immutable bijection between the distinct characters of a corpus and `[0, len)`.
///
/// Codes follow ascending code-point order, so the vocabulary built from a text
/// depends only on the set of characters it contains.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    itos: Vec<char>,
    stoi: FxHashMap<char, Code>,
}

impl Vocabulary {
    /// Builds the vocabulary of the distinct characters in `text`.
    pub fn from_text(text: &str) -> Self {
        let chars: BTreeSet<char> = text.chars().collect();
        Self::from_sorted(chars.into_iter().collect())
    }

    /// Builds a vocabulary from characters listed in code order.
    ///
    /// The list must be strictly ascending, which also rules out duplicates.
    pub fn from_chars(chars: Vec<char>) -> Result<Self> {
        if let Some(pair) = chars.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PrepError::Serialization(format!(
                "vocabulary characters must be strictly ascending, found {:?} before {:?}",
                pair[0], pair[1]
            )));
        }
        Ok(Self::from_sorted(chars))
    }

    // At most 0x110000 distinct chars exist, so every index fits in a `Code`.
    fn from_sorted(itos: Vec<char>) -> Self {
        let stoi = itos
            .iter()
            .enumerate()
            .map(|(code, &ch)| (ch, code as Code))
            .collect();
        Self { itos, stoi }
    }

    /// Number of characters in the vocabulary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.itos.len()
    }

    /// Returns `true` when the vocabulary holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    /// Characters in code order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.itos
    }

    /// Returns the code assigned to `ch`.
    #[must_use]
    pub fn code(&self, ch: char) -> Option<Code> {
        self.stoi.get(&ch).copied()
    }

    /// Returns the character assigned to `code`.
    #[must_use]
    pub fn char(&self, code: Code) -> Option<char> {
        self.itos.get(code as usize).copied()
    }

    /// Maps every character of `text` to its code.
    pub fn encode(&self, text: &str) -> Result<Vec<Code>> {
        text.chars()
            .enumerate()
            .map(|(position, symbol)| {
                self.code(symbol)
                    .ok_or(PrepError::UnknownSymbol { symbol, position })
            })
            .collect()
    }

    /// Maps every code back to its character.
    pub fn decode(&self, codes: &[Code]) -> Result<String> {
        codes
            .iter()
            .enumerate()
            .map(|(position, &code)| {
                self.char(code).ok_or(PrepError::InvalidCode {
                    code,
                    position,
                    vocab_size: self.len(),
                })
            })
            .collect()
    }

    /// Concatenates the characters in code order.
    #[must_use]
    pub fn alphabet(&self) -> String {
        self.itos.iter().collect()
    }
}
