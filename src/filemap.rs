//! Scoped read-only mapping of a path into a byte range.
//!
//! This is the `FileReader` of the C++ original (`mmap` + `munmap` on drop)
//! rewired onto the `memmap` crate the teacher already depends on but never
//! uses. `Mmap` takes care of unmapping on drop itself, so there is no need
//! for the manual `munmap`/`assert` dance `FileReader::~FileReader` did.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap::Mmap;

use crate::error::{CedoError, Result};

pub struct FileMap {
    mmap: Mmap,
}

impl FileMap {
    pub fn open(path: impl AsRef<Path>) -> Result<FileMap> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| CedoError::Io {
            path: path.clone(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| CedoError::Io { path, source })?;
        Ok(FileMap { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
