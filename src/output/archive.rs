//! Zip export of a run's saved images

use crate::{CrawlerError, Result};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Lists the `.png` files directly inside `dir`, sorted by name
pub fn list_png_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| CrawlerError::Filesystem {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_png(path))
        .collect();

    files.sort();
    Ok(files)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// Bundles every PNG file of `dir` into an in-memory zip
///
/// Entries are stored flat under their file names. Files other than PNGs are
/// left out.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The zip container bytes
/// * `Err(CrawlerError)` - The directory could not be read or a file failed to pack
pub fn bundle_directory(dir: &Path) -> Result<Vec<u8>> {
    let files = list_png_files(dir)?;
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for path in &files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let data = std::fs::read(path).map_err(|source| CrawlerError::Filesystem {
            path: path.clone(),
            source,
        })?;

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    let archive = writer.finish()?.into_inner();
    tracing::debug!(
        "Bundled {} files from {} ({} bytes)",
        files.len(),
        dir.display(),
        archive.len()
    );

    Ok(archive)
}

/// Writes the zip of `dir` to `destination`, returning the number of bytes written
pub fn write_archive(dir: &Path, destination: &Path) -> Result<usize> {
    let archive = bundle_directory(dir)?;
    std::fs::write(destination, &archive).map_err(|source| CrawlerError::Filesystem {
        path: destination.to_path_buf(),
        source,
    })?;
    Ok(archive.len())
}
