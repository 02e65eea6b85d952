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

//! An in-memory [`Storage`] that can be told to fail its next erase or write calls.
//!
//! Exposed behind `std` or `test` so other crates can drive the same migration paths this
//! crate's own tests use, without needing a real flash device or a temp file.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::FlashCode;
use crate::{Storage, StorageIndex, StorageResult};
use wasefire_error::Error;

/// An in-memory flash region for tests, with bytes starting erased (`0xff`) like real NOR flash.
pub struct BufferStorage {
    word_size: usize,
    page_size: usize,
    bytes: Vec<u8>,
    fail_next_erases: usize,
    fail_next_writes: usize,
}

impl BufferStorage {
    /// Creates a fresh, fully-erased region of `num_pages` pages of `page_size` bytes each.
    pub fn new(word_size: usize, page_size: usize, num_pages: usize) -> Self {
        BufferStorage {
            word_size,
            page_size,
            bytes: vec![0xff; page_size * num_pages],
            fail_next_erases: 0,
            fail_next_writes: 0,
        }
    }

    /// Makes the next `count` calls to [`Storage::erase_page`] fail, in order.
    pub fn fail_next_erases(&mut self, count: usize) {
        self.fail_next_erases = count;
    }

    /// Makes the next `count` calls to [`Storage::write_slice`] fail, in order.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.fail_next_writes = count;
    }

    /// Flips a bit in the byte at `page`/`byte`, without going through [`Storage::write_slice`].
    ///
    /// Used to simulate corruption that a CRC check should catch, as opposed to a flash write
    /// failure that the wear-leveling loop should catch.
    pub fn corrupt_byte(&mut self, page: usize, byte: usize) {
        let index = page * self.page_size + byte;
        self.bytes[index] ^= 0x01;
    }
}

impl Storage for BufferStorage {
    fn word_size(&self) -> usize {
        self.word_size
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn num_pages(&self) -> usize {
        self.bytes.len() / self.page_size
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
        if self.fail_next_writes > 0 {
            self.fail_next_writes -= 1;
            return Err(Error::new(crate::error::StoreSpace::Flash, FlashCode::WriteErr));
        }
        let range = index.range(value.len(), self)?;
        for (byte, &bit) in self.bytes[range].iter_mut().zip(value) {
            *byte &= bit;
        }
        Ok(())
    }

    fn erase_page(&mut self, page: usize) -> StorageResult<()> {
        if self.fail_next_erases > 0 {
            self.fail_next_erases -= 1;
            return Err(Error::new(crate::error::StoreSpace::Flash, FlashCode::EraseErr));
        }
        let start = page * self.page_size;
        self.bytes[start .. start + self.page_size].fill(0xff);
        Ok(())
    }
}
