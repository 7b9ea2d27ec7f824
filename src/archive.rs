//! Zip packaging of a prepared dataset tree.

use std::fs::File;
use std::io;
use std::path::Path;

use log::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::YoloprepError;
use crate::scan::{rel_string, walk_all_files};

/// Archive the tree under `src_dir` into `zip_path`.
///
/// Entries are stored deflated, with paths relative to `src_dir` using `/`
/// separators, in sorted order so reruns produce identical listings.
pub fn zip_dir(src_dir: &Path, zip_path: &Path) -> Result<(), YoloprepError> {
    let files = walk_all_files(src_dir)?;

    let file = File::create(zip_path).map_err(YoloprepError::Io)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = rel_string(src_dir, path);
        writer
            .start_file(&name, options)
            .map_err(|source| YoloprepError::Zip {
                path: zip_path.to_path_buf(),
                source,
            })?;

        let mut reader = File::open(path).map_err(YoloprepError::Io)?;
        io::copy(&mut reader, &mut writer).map_err(YoloprepError::Io)?;
    }

    writer.finish().map_err(|source| YoloprepError::Zip {
        path: zip_path.to_path_buf(),
        source,
    })?;

    info!("wrote {} ({} entries)", zip_path.display(), files.len());
    Ok(())
}
