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

//! Record encoding: `key '=' value '\0'`, zero-padded to a multiple of 4 bytes.

use alloc::vec::Vec;

fn round_up_4(n: usize) -> usize {
    (n + 3) & !3
}

/// Returns the padded length of a record for `key` and `value` of the given lengths.
pub(crate) fn record_len(key_len: usize, value_len: usize) -> usize {
    round_up_4(key_len + value_len + 2)
}

/// Encodes `key '=' value '\0'`, zero-padded to a multiple of 4 bytes.
pub(crate) fn encode(key: &str, value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(record_len(key.len(), value.len()));
    out.extend_from_slice(key.as_bytes());
    out.push(b'=');
    out.extend_from_slice(value.as_bytes());
    out.push(0);
    out.resize(round_up_4(out.len()), 0);
    out
}

/// A decoded `key=value` record: its byte offset within the detail area, its borrowed key and
/// value, and its padded on-flash length.
pub(crate) struct Record<'a> {
    pub offset: usize,
    pub key: &'a str,
    pub value: &'a str,
    pub len: usize,
}

/// Walks the records of a detail area front to back.
///
/// Stepping by each record's padded length (rather than the raw `strlen(ptr) + 1` the on-flash
/// format could also be scanned with) is equivalent for every live record, since the pad bytes
/// are always `0x00` and never form a second `=`, and it avoids revisiting them one byte at a
/// time.
pub(crate) struct Records<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Records { data, pos: 0 }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.data[start ..];
        let nul = rest.iter().position(|&b| b == 0)?;
        let raw = &rest[.. nul];
        let eq = raw.iter().position(|&b| b == b'=')?;
        let key = core::str::from_utf8(&raw[.. eq]).ok()?;
        let value = core::str::from_utf8(&raw[eq + 1 ..]).ok()?;
        let len = round_up_4(nul + 1);
        self.pos = start + len;
        Some(Record { offset: start, key, value, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pads_to_word() {
        assert_eq!(encode("a", "1"), b"a=1\0");
        assert_eq!(encode("user", "admin"), b"user=admin\0\0");
        assert_eq!(record_len(4, 5), 12);
    }

    #[test]
    fn encode_allows_equals_in_value() {
        assert_eq!(encode("ip", "a=b"), b"ip=a=b\0\0");
    }

    #[test]
    fn walk_recovers_every_record() {
        let mut data = encode("boot_times", "0");
        data.extend(encode("user", "admin"));
        let records: Vec<_> = Records::new(&data).map(|r| (r.key, r.value)).collect();
        assert_eq!(records, vec![("boot_times", "0"), ("user", "admin")]);
    }

    #[test]
    fn walk_stops_at_data_end() {
        let data = encode("a", "1");
        assert_eq!(Records::new(&data).count(), 1);
    }
}
