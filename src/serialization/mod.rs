//! Helpers for (de)serialising token files and vocabulary metadata.

pub mod metadata;
pub mod tokens;

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{PrepError, Result};

pub use metadata::{deserialize_metadata, load_metadata, serialize_metadata, Metadata};
pub use tokens::{deserialize_tokens, serialize_tokens};

/// Writes `bytes` to `path` through a temporary sibling file that is renamed into place.
///
/// Readers observe either the previous file or the complete new contents, never a
/// partially written file.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| PrepError::io(err, Some(parent.to_path_buf())))?;
    let mut file = NamedTempFile::new_in(parent)
        .map_err(|err| PrepError::io(err, Some(parent.to_path_buf())))?;
    file.write_all(bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    file.persist(path)
        .map_err(|err| PrepError::io(err.error, Some(path.to_path_buf())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old contents").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file was renamed away");
    }

    #[test]
    fn write_atomic_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("meta.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }
}
