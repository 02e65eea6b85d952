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

//! CRC-32 over the detail-end-address header word and the detail area.

/// Computes the CRC-32 of `header_word0` followed by `detail`.
pub(crate) fn compute(header_word0: &[u8], detail: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header_word0);
    hasher.update(detail);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depends_on_every_byte() {
        let base = compute(&[1, 2, 3, 4], b"user=admin\0\0");
        assert_ne!(base, compute(&[1, 2, 3, 5], b"user=admin\0\0"));
        assert_ne!(base, compute(&[1, 2, 3, 4], b"user=Admin\0\0"));
    }
}
