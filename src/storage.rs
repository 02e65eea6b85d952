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

//! The external flash adapter contract: word-aligned reads, writes, and erases against a
//! page-addressed storage window.

use alloc::borrow::Cow;
use core::ops::Range;

use wasefire_error::{Code, Error};

/// Result of a [`Storage`] operation.
pub type StorageResult<T> = Result<T, Error>;

/// Identifies a byte location within a [`Storage`] as a page and an offset within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageIndex {
    pub page: usize,
    pub byte: usize,
}

impl StorageIndex {
    /// Returns the byte range `[start, start + length)` this index designates within `storage`.
    ///
    /// The range never crosses a page boundary: `self.byte + length` must fit within one page.
    pub fn range(&self, length: usize, storage: &impl Storage) -> StorageResult<Range<usize>> {
        if storage.num_pages() <= self.page || storage.page_size() < self.byte + length {
            return Err(Error::user(Code::OutOfBounds));
        }
        let start = self.page * storage.page_size() + self.byte;
        Ok(start .. start + length)
    }
}

/// Word-aligned access to a flash-backed region, owned entirely by a [`crate::Store`].
///
/// Implementations round `erase_page` up to their erase granularity and only ever clear bits on
/// `write_slice` (an erased page reads as all ones), matching how NOR flash actually behaves.
pub trait Storage {
    /// Smallest unit a [`Self::write_slice`] call must be aligned and sized to.
    fn word_size(&self) -> usize;

    /// Size in bytes of one erase unit.
    fn page_size(&self) -> usize;

    /// Number of pages in the region.
    fn num_pages(&self) -> usize;

    /// Maximum number of times a word may be written between erases.
    fn max_word_writes(&self) -> usize;

    /// Maximum number of times a page may be erased over its lifetime.
    fn max_page_erases(&self) -> usize;

    /// Reads `length` bytes at `index`.
    fn read_slice(&self, index: StorageIndex, length: usize) -> StorageResult<Cow<'_, [u8]>>;

    /// Writes `value` at `index`.
    fn write_slice(&mut self, index: StorageIndex, value: &[u8]) -> StorageResult<()>;

    /// Erases the page at `page`.
    fn erase_page(&mut self, page: usize) -> StorageResult<()>;
}

/// Reads `out.len()` bytes starting `start` bytes into `page`, chunked at page boundaries.
pub(crate) fn read_bytes<S: Storage>(
    storage: &S, page: usize, start: usize, out: &mut [u8],
) -> StorageResult<()> {
    let page_size = storage.page_size();
    let mut done = 0;
    while done < out.len() {
        let abs = start + done;
        let cur_page = page + abs / page_size;
        let byte = abs % page_size;
        let chunk = (page_size - byte).min(out.len() - done);
        let data = storage.read_slice(StorageIndex { page: cur_page, byte }, chunk)?;
        out[done .. done + chunk].copy_from_slice(&data);
        done += chunk;
    }
    Ok(())
}

/// Writes `data` starting `start` bytes into `page`, chunked at page boundaries.
pub(crate) fn write_bytes<S: Storage>(
    storage: &mut S, page: usize, start: usize, data: &[u8],
) -> StorageResult<()> {
    let page_size = storage.page_size();
    let mut done = 0;
    while done < data.len() {
        let abs = start + done;
        let cur_page = page + abs / page_size;
        let byte = abs % page_size;
        let chunk = (page_size - byte).min(data.len() - done);
        storage.write_slice(StorageIndex { page: cur_page, byte }, &data[done .. done + chunk])?;
        done += chunk;
    }
    Ok(())
}

/// Erases `count` consecutive pages starting at `page`.
pub(crate) fn erase_pages<S: Storage>(
    storage: &mut S, page: usize, count: usize,
) -> StorageResult<()> {
    for p in page .. page + count {
        storage.erase_page(p)?;
    }
    Ok(())
}
