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

//! Locates the active data block on boot, falling back to defaults when the region is
//! uninitialized or corrupt.
//!
//! Every fallback-to-defaults path logs a warning first, so an operator can tell "first boot"
//! apart from "recovered from corruption" in the field. The policy itself is unchanged from the
//! design this crate is implementing: any of an unset slot, an out-of-range slot or header, or
//! (with CRC enabled) a checksum mismatch resets to defaults; a transient read glitch can still
//! cost the caller their data.

use alloc::vec;
use alloc::vec::Vec;

use crate::persist::{save, write_system_slot};
use crate::storage::read_bytes;
use crate::{mutate, Storage, Store, StoreResult};

pub(crate) fn load<S: Storage>(store: &mut Store<S>) -> StoreResult<()> {
    let page_size = store.storage.page_size();
    let total_size = page_size * store.storage.num_pages();

    let slot = read_u32(store, 0, 0)?;
    if slot == u32::MAX || slot as usize > total_size {
        wasefire_logger::info!("store slot unset, installing defaults");
        store.active_page = 1;
        write_system_slot(store, page_size as u32)?;
        return reset_to_defaults(store);
    }

    let active_addr = slot as usize;
    store.active_page = active_addr / page_size;

    let detail_end_addr = read_u32(store, store.active_page, 0)? as usize;
    if detail_end_addr > total_size || detail_end_addr < active_addr + store.header_bytes {
        wasefire_logger::warn!("store active block out of range, installing defaults");
        return reset_to_defaults(store);
    }

    let detail_size = detail_end_addr - active_addr - store.header_bytes;
    {
        let header_bytes = store.header_bytes;
        let page = store.active_page;
        let mut detail = vec![0u8; detail_size];
        read_bytes(&store.storage, page, header_bytes, &mut detail)?;
        store.image[header_bytes .. header_bytes + detail_size].copy_from_slice(&detail);
    }
    store.image[0 .. 4].copy_from_slice(&(detail_end_addr as u32).to_le_bytes());

    if store.crc_enabled {
        let stored_crc = read_u32(store, store.active_page, 4)?;
        store.image[4 .. 8].copy_from_slice(&stored_crc.to_le_bytes());
        let computed = crate::crc::compute(
            &store.image[0 .. 4],
            &store.image[store.header_bytes .. store.header_bytes + detail_size],
        );
        if computed != stored_crc {
            wasefire_logger::warn!("store crc mismatch, installing defaults");
            return reset_to_defaults(store);
        }
    }

    store.detail_size = detail_size;
    Ok(())
}

pub(crate) fn reset_to_defaults<S: Storage>(store: &mut Store<S>) -> StoreResult<()> {
    store.detail_size = 0;
    let defaults: Vec<_> = store.defaults.clone();
    for (key, value) in &defaults {
        mutate::create(store, key, value)?;
    }
    save(store)?;
    Ok(())
}

fn read_u32<S: Storage>(store: &Store<S>, page: usize, byte: usize) -> StoreResult<u32> {
    let mut buf = [0u8; 4];
    read_bytes(&store.storage, page, byte, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use crate::testing::BufferStorage;
    use crate::Store;

    #[test]
    fn first_boot_installs_defaults() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let store = Store::new(storage, &[("boot_times", "0"), ("user", "admin")], false).unwrap();
        assert_eq!(store.get("boot_times").unwrap().as_deref(), Some("0"));
        assert_eq!(store.get("user").unwrap().as_deref(), Some("admin"));
        assert_eq!(store.active_page, 1);
    }

    #[test]
    fn corrupt_header_falls_back_to_defaults() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let mut store = Store::new(storage, &[("a", "1")], false).unwrap();
        store.set("a", "2").unwrap();
        store.save().unwrap();
        // Corrupt the active block's header word so its detail end is out of range.
        store.image[0 .. 4].copy_from_slice(&u32::MAX.to_le_bytes());
        store.save().unwrap();
        store.reload().unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn crc_mismatch_falls_back_to_defaults() {
        let storage = BufferStorage::new(4, 0x200, 8);
        let mut store = Store::new(storage, &[("a", "1")], true).unwrap();
        store.set("a", "2").unwrap();
        store.save().unwrap();
        // Flip a bit in the persisted detail area without touching the CRC.
        let header_bytes = store.header_bytes;
        store.storage.corrupt_byte(1, header_bytes);
        store.reload().unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}
