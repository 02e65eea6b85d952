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

//! Linear lookup of a key within a detail area.

use crate::codec::{Record, Records};
use crate::error::name_error;
use crate::StoreResult;

/// Finds `key` within `detail`, returning its record if present.
///
/// A candidate matches only when its key slice equals `key` exactly, not merely when `key` is a
/// byte-prefix of it, so a key that happens to prefix another key or a value never matches.
pub(crate) fn find<'a>(detail: &'a [u8], key: &str) -> StoreResult<Option<Record<'a>>> {
    if key.is_empty() {
        return Err(name_error());
    }
    Ok(Records::new(detail).find(|record| record.key == key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn finds_exact_key_only() {
        let mut data = encode("user", "admin");
        data.extend(encode("username", "root"));
        assert_eq!(find(&data, "user").unwrap().unwrap().value, "admin");
        assert_eq!(find(&data, "username").unwrap().unwrap().value, "root");
        assert!(find(&data, "use").unwrap().is_none());
    }

    #[test]
    fn empty_key_is_name_error() {
        assert!(find(&[], "").is_err());
    }

    #[test]
    fn miss_is_none_not_error() {
        let data = encode("user", "admin");
        assert!(find(&data, "missing").unwrap().is_none());
    }
}
