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

#![no_main]

use std::collections::BTreeMap;

use flash_store::testing::BufferStorage;
use flash_store::Store;
use libfuzzer_sys::{fuzz_target, Corpus};
use rand_core::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use strum::{EnumCount, FromRepr};

// Keys are drawn from a small fixed pool rather than generated fresh every time, so collisions
// (overwrite, delete-then-recreate, migration while a key is live) are common instead of rare.
const KEYS: [&str; 6] = ["boot", "user", "ip", "a", "b", "c"];

// Drives a `Store` and a plain `BTreeMap` shadow model with the same sequence of operations and
// asserts they never disagree on a live key's value. Exercises the same `set`/`del`/`save`/
// `reload` surface `persist::tests` and `load::tests` cover by hand, over arbitrary interleavings.
fuzz_target!(|data: &[u8]| -> Corpus {
    if data.len() < 8 {
        return Corpus::Reject;
    }
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&data[.. 8]);
    let mut rng = Pcg32::seed_from_u64(u64::from_le_bytes(seed));
    let steps = data.len() - 8;

    let storage = BufferStorage::new(4, 0x80, 16);
    let Ok(mut store) = Store::new(storage, &[("boot", "0")], true) else {
        return Corpus::Reject;
    };
    let mut shadow = BTreeMap::new();
    shadow.insert("boot".to_owned(), "0".to_owned());
    // Tracks the RAM shadow as of the last successful save, since `reload` discards unsaved
    // changes and reverts the store to exactly that state.
    let mut saved_shadow = shadow.clone();

    for _ in 0 .. steps {
        match Op::from_repr((rng.next_u32() as usize) % Op::COUNT).unwrap() {
            Op::Set => {
                let key = KEYS[rng.next_u32() as usize % KEYS.len()];
                let value = random_value(&mut rng);
                match store.set(key, &value) {
                    Ok(()) => {
                        if value.is_empty() {
                            shadow.remove(key);
                        } else {
                            shadow.insert(key.to_owned(), value);
                        }
                    }
                    Err(_) => continue,
                }
            }
            Op::Del => {
                let key = KEYS[rng.next_u32() as usize % KEYS.len()];
                if store.del(key).is_ok() {
                    shadow.remove(key);
                }
            }
            Op::Save => {
                // A failed save (region exhausted) leaves the RAM image untouched, so the shadow
                // model doesn't move either way.
                if store.save().is_ok() {
                    saved_shadow = shadow.clone();
                }
            }
            Op::Reload => {
                if store.reload().is_err() {
                    return Corpus::Reject;
                }
                shadow = saved_shadow.clone();
            }
        }
        for (key, value) in &shadow {
            assert_eq!(store.get(key).unwrap().as_deref(), Some(value.as_str()));
        }
    }
    Corpus::Keep
});

fn random_value(rng: &mut Pcg32) -> String {
    let len = rng.next_u32() as usize % 24;
    (0 .. len).map(|_| (b'a' + (rng.next_u32() % 26) as u8) as char).collect()
}

#[derive(Clone, Copy, EnumCount, FromRepr)]
enum Op {
    Set,
    Del,
    Save,
    Reload,
}
