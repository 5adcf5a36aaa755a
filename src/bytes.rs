//! Utilities for converting between raw dump bytes and character text.
//!
//! Every byte maps to the code point with the same value (the Latin-1 block), so
//! no multi-byte decoding takes place and the mapping is reversible for any input.

use crate::error::{PrepError, Result};

/// Largest code point produced by [`bytes_to_text`].
pub const MAX_BYTE_CHAR: char = '\u{FF}';

/// Interprets each byte as its own code point.
#[must_use]
pub fn bytes_to_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Converts text produced by [`bytes_to_text`] back to raw bytes.
///
/// Fails when the text contains a character above `U+00FF`, which can only come from
/// metadata that was not produced from a byte corpus.
pub fn text_to_bytes(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .enumerate()
        .map(|(position, ch)| {
            u8::try_from(ch).map_err(|_| {
                PrepError::Serialization(format!(
                    "character U+{:04X} at position {position} is outside the byte range",
                    u32::from(ch)
                ))
            })
        })
        .collect()
}

/// Renders a character for human-readable vocabulary listings.
///
/// Printable characters are shown as-is; control characters and the upper
/// Latin-1 controls use their Rust escape form so listings stay on one line.
#[must_use]
pub fn display_char(ch: char) -> String {
    if ch.is_control() {
        ch.escape_default().collect()
    } else {
        ch.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_text_round_trip() {
        let bytes: Vec<u8> = (0..=u8::MAX).collect();
        let text = bytes_to_text(&bytes);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(text.chars().max(), Some(MAX_BYTE_CHAR));
        let restored = text_to_bytes(&text).unwrap();
        assert_eq!(restored, bytes);
    }

    #[test]
    fn high_bytes_are_not_decoded_as_utf8() {
        // "é" in UTF-8 is two bytes and must stay two characters.
        let text = bytes_to_text("é".as_bytes());
        assert_eq!(text, "\u{C3}\u{A9}");
    }

    #[test]
    fn text_to_bytes_rejects_wide_characters() {
        let err = text_to_bytes("a\u{263A}").expect_err("should fail");
        assert!(matches!(err, PrepError::Serialization(message) if message.contains("U+263A")));
    }

    #[test]
    fn display_char_escapes_controls() {
        assert_eq!(display_char('\n'), "\\n");
        assert_eq!(display_char('a'), "a");
        assert_eq!(display_char('\u{85}'), "\\u{85}");
    }
}
