//! Recursive copy used to propagate shared resources into student folders.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::io::marker::MARKER_FILE;

/// Counters reported after a copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
}

/// Copy the contents of `source` into `target`.
///
/// Decoration markers are never copied. Existing files are kept unless
/// `overwrite` is set.
pub fn copy_tree(source: &Path, target: &Path, overwrite: bool) -> Result<CopyStats> {
    if !source.is_dir() {
        return Err(Error::NotFound {
            path: source.to_path_buf(),
        });
    }
    fs::create_dir_all(target).with_path("create", target)?;

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::io("walk", source, io::Error::from(err)))?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).with_path("create", &dest)?;
            continue;
        }
        if entry.file_name() == MARKER_FILE {
            continue;
        }
        if !overwrite && dest.exists() {
            stats.skipped += 1;
            continue;
        }
        fs::copy(entry.path(), &dest).with_path("copy", entry.path())?;
        stats.copied += 1;
    }

    debug!(
        source = %source.display(),
        target = %target.display(),
        copied = stats.copied,
        skipped = stats.skipped,
        "tree copied"
    );
    Ok(stats)
}
