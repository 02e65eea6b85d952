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

//! Flushes the RAM image to flash, migrating the active block forward on erase or write failure.
//!
//! Erase/program failures on NOR flash usually mean a worn-out sector. Stepping the active block
//! forward by a payload-sized multiple of the page size guarantees the next attempt lands on
//! untouched pages, bounded by the number of pages left in the region.

use crate::error::full;
use crate::storage::{erase_pages, write_bytes};
use crate::{Storage, Store, StoreResult};

/// Erases and writes the active block, migrating forward on flash failure.
///
/// Returns the number of migrations this call performed.
pub(crate) fn save<S: Storage>(store: &mut Store<S>) -> StoreResult<u32> {
    let page_size = store.storage.page_size();
    let total_size = page_size * store.storage.num_pages();
    let entry_page = store.active_page;
    let mut migrations = 0u32;

    loop {
        let active_addr = store.active_page * page_size;
        if active_addr + store.header_bytes + store.detail_size >= total_size {
            if let Err(err) = write_system_slot(store, u32::MAX) {
                wasefire_logger::warn!("failed to invalidate exhausted store slot: {}", err);
            }
            return Err(full());
        }

        stamp_header(store, active_addr);

        let block_len = store.header_bytes + store.detail_size;
        let pages_needed = block_len.div_ceil(page_size);
        let result = erase_pages(&mut store.storage, store.active_page, pages_needed)
            .and_then(|()| write_bytes(&mut store.storage, store.active_page, 0, &store.image[.. block_len]));

        match result {
            Ok(()) => break,
            Err(err) => {
                wasefire_logger::warn!("flash operation failed, migrating store: {}", err);
                let step_pages = store.detail_size / page_size + 1;
                store.active_page += step_pages;
                migrations += 1;
            }
        }
    }

    if store.active_page != entry_page {
        let active_addr = (store.active_page * page_size) as u32;
        write_system_slot(store, active_addr)?;
    }
    store.migrations += u64::from(migrations);
    Ok(migrations)
}

fn stamp_header<S: Storage>(store: &mut Store<S>, active_addr: usize) {
    let detail_end_addr = (active_addr + store.header_bytes + store.detail_size) as u32;
    store.image[0 .. 4].copy_from_slice(&detail_end_addr.to_le_bytes());
    if store.crc_enabled {
        let end = store.header_bytes + store.detail_size;
        let crc = crate::crc::compute(&store.image[0 .. 4], &store.image[store.header_bytes .. end]);
        store.image[4 .. 8].copy_from_slice(&crc.to_le_bytes());
    }
}

/// Erases then overwrites the system slot (word 0 of page 0) with `value`.
pub(crate) fn write_system_slot<S: Storage>(store: &mut Store<S>, value: u32) -> StoreResult<()> {
    store.storage.erase_page(0)?;
    write_bytes(&mut store.storage, 0, 0, &value.to_le_bytes())
}
