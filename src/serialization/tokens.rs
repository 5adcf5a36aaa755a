//! Headerless fixed-width little-endian token files.

use crate::config::CodeWidth;
use crate::error::{PrepError, Result};
use crate::vocab::Code;

/// Serialises `codes` as concatenated little-endian integers of the given width.
///
/// There is no header, length prefix, or padding. A code that does not fit the width
/// yields [`PrepError::VocabOverflow`].
pub fn serialize_tokens(codes: &[Code], width: CodeWidth) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(codes.len() * width.bytes());
    match width {
        CodeWidth::U16 => {
            for &code in codes {
                let narrow = u16::try_from(code).map_err(|_| PrepError::VocabOverflow {
                    vocab_size: code as usize + 1,
                    capacity: width.capacity(),
                })?;
                out.extend_from_slice(&narrow.to_le_bytes());
            }
        }
        CodeWidth::U32 => {
            for &code in codes {
                out.extend_from_slice(&code.to_le_bytes());
            }
        }
    }
    Ok(out)
}

/// Parses a token file produced by [`serialize_tokens`].
pub fn deserialize_tokens(bytes: &[u8], width: CodeWidth) -> Result<Vec<Code>> {
    let stride = width.bytes();
    if bytes.len() % stride != 0 {
        return Err(PrepError::Serialization(format!(
            "token data of {} bytes is not a multiple of the {stride}-byte {width} width",
            bytes.len()
        )));
    }
    let codes = match width {
        CodeWidth::U16 => bytes
            .chunks_exact(2)
            .map(|chunk| Code::from(u16::from_le_bytes([chunk[0], chunk[1]])))
            .collect(),
        CodeWidth::U32 => bytes
            .chunks_exact(4)
            .map(|chunk| Code::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    };
    Ok(codes)
}
