// Copyright The flash-store Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A file-backed [`Storage`] for desktop tests and tooling.
//!
//! Only available with the `std` feature. The whole region is kept in memory and mirrored to a
//! single file on every write or erase, so a [`Store`](crate::Store) built on [`FileStorage`]
//! actually survives across process-equivalent reconstructions, which is the point of testing
//! persistence outside an embedded target.

use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use wasefire_error::{Code, Error};

use crate::{Storage, StorageIndex, StorageResult};

/// Geometry for a [`FileStorage`] region.
#[derive(Debug, Clone, Copy)]
pub struct FileOptions {
    /// Smallest unit a write must be aligned and sized to.
    pub word_size: usize,
    /// Size in bytes of one erase unit.
    pub page_size: usize,
    /// Number of pages in the region.
    pub num_pages: usize,
}

/// A [`Storage`] backed by a single file, one byte of file per byte of region.
///
/// The file is created (and zero-extended to `0xff`, matching erased NOR flash) if it doesn't
/// exist or is shorter than the region; an existing, correctly-sized file is used as-is, so a
/// [`Store`](crate::Store) reopened on the same path picks up exactly what the previous one saved.
pub struct FileStorage {
    file: File,
    bytes: Vec<u8>,
    options: FileOptions,
}

impl FileStorage {
    /// Opens (creating if needed) a file-backed region of `options.num_pages` pages at `path`.
    pub fn new(path: &Path, options: FileOptions) -> StorageResult<Self> {
        let total_size = options.page_size * options.num_pages;
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).open(path).map_err(to_error)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(to_error)?;
        if bytes.len() != total_size {
            bytes = vec![0xff; total_size];
            file.set_len(total_size as u64).map_err(to_error)?;
            file.seek(SeekFrom::Start(0)).map_err(to_error)?;
            file.write_all(&bytes).map_err(to_error)?;
            file.flush().map_err(to_error)?;
        }
        Ok(FileStorage { file, bytes, options })
    }

    fn flush_range(&mut self, range: core::ops::Range<usize>) -> StorageResult<()> {
        self.file.seek(SeekFrom::Start(range.start as u64)).map_err(to_error)?;
        self.file.write_all(&self.bytes[range]).map_err(to_error)?;
        self.file.flush().map_err(to_error)
    }
}

impl Storage for FileStorage {
    fn word_size(&self) -> usize {
        self.options.word_size
    }

    fn page_size(&self) -> usize {
        self.options.page_size
    }

    fn num_pages(&self) -> usize {
        self.options.num_pages
    }

    fn max_word_writes(&self) -> usize {
        2
    }

    fn max_page_erases(&self) -> usize {
        100_000
    }

    fn read_slice(&self, index: StorageIndex, length: usize) -> StorageResult<Cow<'_, [u8]>> {
        let range = index.range(length, self)?;
        Ok(Cow::Borrowed(&self.bytes[range]))
    }

    fn write_slice(&mut self, index: StorageIndex, value: &[u8]) -> StorageResult<()> {
        let range = index.range(value.len(), self)?;
        for (byte, &bit) in self.bytes[range.clone()].iter_mut().zip(value) {
            *byte &= bit;
        }
        self.flush_range(range)
    }

    fn erase_page(&mut self, page: usize) -> StorageResult<()> {
        if page >= self.options.num_pages {
            return Err(Error::user(Code::OutOfBounds));
        }
        let page_size = self.options.page_size;
        let start = page * page_size;
        self.bytes[start .. start + page_size].fill(0xff);
        self.flush_range(start .. start + page_size)
    }
}

fn to_error(_: std::io::Error) -> Error {
    Error::world(0)
}
