//! Facilities for loading a raw dump member into memory.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use log::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::config::{Compression, InputConfig};
use crate::error::{PrepError, Result};

/// Loads the raw bytes of one extracted archive member.
///
/// The whole file is read into memory. With [`Compression::Bzip2`] (or a `.bz2`
/// extension under [`Compression::Auto`]) every bzip2 stream in the file is
/// decompressed and concatenated. With [`Compression::Zip`] (or a `.zip`
/// extension) the member named by [`InputConfig::member`] is extracted, or the
/// only file of the archive when no member is named.
pub fn load_raw_dump<P: AsRef<Path>>(path: P, cfg: &InputConfig) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let metadata = path
        .metadata()
        .map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    if !metadata.is_file() {
        return Err(PrepError::InvalidConfig(format!(
            "input path {path:?} is not a regular file"
        )));
    }

    let file = File::open(path).map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    let compression = cfg.resolve_compression(path);
    let mut buffer = Vec::new();
    match compression {
        Compression::Bzip2 => {
            let mut decoder = MultiBzDecoder::new(BufReader::new(file));
            decoder
                .read_to_end(&mut buffer)
                .map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
        }
        Compression::Zip => read_zip_member(file, path, cfg.member.as_deref(), &mut buffer)?,
        Compression::None | Compression::Auto => {
            buffer.reserve(usize::try_from(metadata.len()).unwrap_or(0));
            let mut reader = BufReader::new(file);
            reader
                .read_to_end(&mut buffer)
                .map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
        }
    }
    debug!(
        "loaded {} bytes from {} ({compression:?})",
        buffer.len(),
        path.display()
    );
    Ok(buffer)
}

fn read_zip_member(
    file: File,
    path: &Path,
    member: Option<&str>,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|err| zip_error(err, path))?;
    let name = match member {
        Some(name) => name.to_owned(),
        None => {
            let files: Vec<&str> = archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .collect();
            match files.as_slice() {
                [only] => (*only).to_owned(),
                _ => {
                    return Err(PrepError::InvalidConfig(format!(
                        "archive {path:?} holds {} files; name the member to extract",
                        files.len()
                    )))
                }
            }
        }
    };
    let mut entry = archive.by_name(&name).map_err(|err| match err {
        ZipError::FileNotFound => {
            PrepError::InvalidConfig(format!("archive {path:?} has no member {name:?}"))
        }
        other => zip_error(other, path),
    })?;
    buffer.reserve(usize::try_from(entry.size()).unwrap_or(0));
    entry
        .read_to_end(buffer)
        .map_err(|err| PrepError::io(err, Some(path.to_path_buf())))?;
    debug!("extracted member {name:?} from {}", path.display());
    Ok(())
}

fn zip_error(err: ZipError, path: &Path) -> PrepError {
    match err {
        ZipError::Io(source) => PrepError::io(source, Some(path.to_path_buf())),
        other => PrepError::MalformedInput(format!("unreadable zip archive {path:?}: {other}")),
    }
}
