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

//! Create, delete, and overwrite operations on the in-RAM detail area.
//!
//! None of these touch flash: the RAM image is authoritative until [`crate::Store::save`] flushes
//! it.

use crate::error::{full, name_error, name_exists};
use crate::{codec, index, Storage, Store, StoreResult};

fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.contains('=') {
        return Err(name_error());
    }
    Ok(())
}

pub(crate) fn create<S: Storage>(store: &mut Store<S>, key: &str, value: &str) -> StoreResult<()> {
    validate_key(key)?;
    if index::find(store.detail_bytes(), key)?.is_some() {
        return Err(name_exists());
    }
    let record = codec::encode(key, value);
    if store.header_bytes + store.detail_size + record.len() >= store.total_size() {
        return Err(full());
    }
    let start = store.header_bytes + store.detail_size;
    store.image[start .. start + record.len()].copy_from_slice(&record);
    store.detail_size += record.len();
    Ok(())
}

pub(crate) fn del<S: Storage>(store: &mut Store<S>, key: &str) -> StoreResult<()> {
    validate_key(key)?;
    let (offset, len) = {
        let record = index::find(store.detail_bytes(), key)?.ok_or_else(name_error)?;
        (record.offset, record.len)
    };
    let base = store.header_bytes;
    store.image.copy_within(base + offset + len .. base + store.detail_size, base + offset);
    store.detail_size -= len;
    Ok(())
}

pub(crate) fn set<S: Storage>(store: &mut Store<S>, key: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return del(store, key);
    }
    validate_key(key)?;
    if index::find(store.detail_bytes(), key)?.is_some() {
        del(store, key)?;
    }
    create(store, key, value)
}

#[cfg(test)]
mod tests {
    use crate::testing::BufferStorage;
    use crate::Store;

    fn store() -> Store<BufferStorage> {
        let storage = BufferStorage::new(4, 0x200, 8);
        Store::new(storage, &[], false).unwrap()
    }

    #[test]
    fn create_rejects_duplicate_and_bad_keys() {
        let mut store = store();
        store.set("a", "1").unwrap();
        assert!(matches!(super::create(&mut store, "a", "2"), Err(_)));
        assert!(matches!(super::create(&mut store, "", "1"), Err(_)));
        assert!(matches!(super::create(&mut store, "a=b", "1"), Err(_)));
    }

    #[test]
    fn del_compacts_detail_area() {
        let mut store = store();
        store.set("a", "1").unwrap();
        let used_before = store.used_size();
        store.set("b", "22").unwrap();
        store.del("b").unwrap();
        assert_eq!(store.used_size(), used_before);
        assert!(store.get("b").unwrap().is_none());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut store = store();
        store.set("user", "admin").unwrap();
        store.set("user", "root").unwrap();
        assert_eq!(store.get("user").unwrap().as_deref(), Some("root"));
        let data = store.detail_bytes();
        assert_eq!(crate::codec::Records::new(data).count(), 1);
    }

    #[test]
    fn set_empty_value_deletes() {
        let mut store = store();
        store.set("a", "1").unwrap();
        store.set("a", "").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn create_fails_full_before_clobbering_image() {
        let mut store = store();
        // Bigger than the whole 7-page region (0x200 * 7 = 3584 bytes), so this can never fit.
        let long = "x".repeat(4000);
        let result = store.set("big", &long);
        assert!(result.is_err());
        assert!(store.get("big").unwrap().is_none());
    }
}
