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

//! A wear-leveled key-value store for NOR-like flash memory.
//!
//! The store occupies a region of [`Storage`] made of a fixed system slot (page 0, word 0) and
//! the rest of the region available to a single relocatable data block. The slot holds the flash
//! address of the block currently in use; [`Store::save`] walks the block forward, page by
//! payload-sized page, whenever the flash underneath refuses an erase or a write, so a handful of
//! worn-out sectors cost capacity rather than data.
//!
//! Keys and values are UTF-8 strings. The detail area backing them is a flat, append-mostly list
//! of `key '=' value '\0'` records padded to a 4-byte boundary; deleting a key compacts the
//! records after it rather than leaving a hole.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

mod codec;
mod crc;
pub mod error;
#[cfg(feature = "std")]
mod file;
mod index;
mod load;
mod mutate;
mod persist;
mod storage;
#[cfg(any(test, feature = "std"))]
pub mod testing;

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "std")]
pub use file::{FileOptions, FileStorage};
pub use storage::{Storage, StorageIndex, StorageResult};
pub use wasefire_error::Error;

/// Result of a [`Store`] operation.
pub type StoreResult<T> = Result<T, Error>;

/// Returns the number of header bytes reserved at the start of each data block: a detail-end
/// address word, plus a CRC-32 word when CRC checking is enabled.
fn header_bytes(crc_enabled: bool) -> usize {
    if crc_enabled {
        8
    } else {
        4
    }
}

/// A key-value store backed by a [`Storage`] region.
///
/// `Store` keeps the entire active block mirrored in RAM (an `image` sized to the whole region,
/// though only its header-plus-detail prefix is meaningful) so that [`Store::get`] and the
/// mutating operations never touch flash; only [`Store::save`] does.
pub struct Store<S: Storage> {
    pub(crate) storage: S,
    /// RAM mirror of the active block: header bytes, then the detail area, sized to the region.
    pub(crate) image: Vec<u8>,
    pub(crate) header_bytes: usize,
    /// Length in bytes of the live detail area within `image`, starting at `header_bytes`.
    pub(crate) detail_size: usize,
    /// Page index of the currently active data block.
    pub(crate) active_page: usize,
    pub(crate) crc_enabled: bool,
    /// Number of times [`Store::save`] has had to migrate the active block, over this store's
    /// lifetime in RAM (not persisted).
    pub(crate) migrations: u64,
    pub(crate) defaults: Vec<(String, String)>,
}

impl<S: Storage> Store<S> {
    /// Opens the store, loading the active block or installing `defaults` if the region is
    /// uninitialized or corrupt.
    ///
    /// The region must have at least 2 pages: page 0 holds the system slot, the rest holds the
    /// data block and its migration room. Set `crc_enabled` to check (and stamp) a CRC-32 over
    /// every saved block; a region written with one setting should keep using it, since a load
    /// with CRC enabled will reject a block saved with it disabled.
    pub fn new(storage: S, defaults: &[(&str, &str)], crc_enabled: bool) -> StoreResult<Self> {
        assert!(storage.num_pages() >= 2, "store region needs at least 2 pages");
        let total_size = storage.page_size() * storage.num_pages();
        let mut store = Store {
            storage,
            image: vec![0; total_size],
            header_bytes: header_bytes(crc_enabled),
            detail_size: 0,
            active_page: 1,
            crc_enabled,
            migrations: 0,
            defaults: defaults.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect(),
        };
        load::load(&mut store)?;
        Ok(store)
    }

    /// Returns the value associated with `key`, if any.
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(index::find(self.detail_bytes(), key)?.map(|record| record.value.to_owned()))
    }

    /// Creates `key` with `value`. Fails with [`error::StoreCode::NameExists`] if `key` is
    /// already present.
    pub fn create(&mut self, key: &str, value: &str) -> StoreResult<()> {
        mutate::create(self, key, value)
    }

    /// Removes `key`. Fails with [`error::StoreCode::NameError`] if `key` is absent.
    pub fn del(&mut self, key: &str) -> StoreResult<()> {
        mutate::del(self, key)
    }

    /// Sets `key` to `value`, overwriting any existing value. Setting an empty value deletes the
    /// key instead, which fails with [`error::StoreCode::NameError`] if the key was already
    /// absent.
    pub fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        mutate::set(self, key, value)
    }

    /// Truncates the detail area, recreates every default, and persists the result.
    ///
    /// This is the same reset the region gets on a fresh or corrupt boot (see
    /// [`Store::new`]); calling it explicitly lets an embedder wipe the store back to a known
    /// state without power-cycling.
    pub fn set_default(&mut self) -> StoreResult<()> {
        load::reset_to_defaults(self)
    }

    /// Flushes the RAM image to flash, migrating the active block forward as needed.
    ///
    /// Returns the number of migrations this call performed, for observability. Returns
    /// [`error::StoreCode::Full`] if the region has no page left to migrate into; the RAM image
    /// still holds every change made before this call, so a caller can retry after freeing space
    /// with [`Store::del`].
    pub fn save(&mut self) -> StoreResult<u32> {
        persist::save(self)
    }

    /// Reloads the active block from flash, discarding any unsaved RAM changes.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.detail_size = 0;
        load::load(self)
    }

    /// Writes a `key=value` dump of every record currently live in RAM to `sink`, one per line,
    /// in on-flash order.
    ///
    /// Takes a [`core::fmt::Write`] sink rather than returning a `String` so this works the same
    /// way under `no_std` (write it to a UART, a fixed buffer, anything that implements the
    /// trait) as it does in a desktop test.
    pub fn print<W: core::fmt::Write>(&self, sink: &mut W) -> core::fmt::Result {
        for record in codec::Records::new(self.detail_bytes()) {
            writeln!(sink, "{}={}", record.key, record.value)?;
        }
        Ok(())
    }

    /// Bytes currently used by the header and detail area of the active block.
    pub fn used_size(&self) -> usize {
        self.header_bytes + self.detail_size
    }

    /// Total bytes available to a single data block: the region size minus the system slot page.
    pub fn total_size(&self) -> usize {
        self.storage.page_size() * self.storage.num_pages() - self.storage.page_size()
    }

    /// Number of times [`Store::save`] has migrated the active block since this `Store` was
    /// constructed.
    pub fn migrations(&self) -> u64 {
        self.migrations
    }

    pub(crate) fn detail_bytes(&self) -> &[u8] {
        &self.image[self.header_bytes .. self.header_bytes + self.detail_size]
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::BufferStorage;
    use crate::Store;

    #[test]
    #[should_panic(expected = "at least 2 pages")]
    fn rejects_single_page_region() {
        let storage = BufferStorage::new(4, 0x200, 1);
        let _ = Store::new(storage, &[], false);
    }

    #[test]
    fn print_dumps_live_records_in_order() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let mut store = Store::new(storage, &[("a", "1")], false).unwrap();
        store.set("b", "2").unwrap();
        let mut dump = String::new();
        store.print(&mut dump).unwrap();
        assert_eq!(dump, "a=1\nb=2\n");
    }

    #[test]
    fn set_default_resets_every_key_and_persists() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let mut store = Store::new(storage, &[("a", "1")], false).unwrap();
        store.set("a", "2").unwrap();
        store.set("b", "x").unwrap();
        store.set_default().unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert!(store.get("b").unwrap().is_none());

        // set_default persists immediately, so a fresh load sees the reset state too.
        store.reload().unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert!(store.get("b").unwrap().is_none());
    }

    #[test]
    fn used_and_total_size_are_consistent() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let store = Store::new(storage, &[], false).unwrap();
        assert_eq!(store.total_size(), 0x200 * 7);
        assert_eq!(store.used_size(), store.header_bytes);
    }
}
