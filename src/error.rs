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

//! Error spaces and codes used by this crate.
//!
//! Errors are represented with [`wasefire_error::Error`] rather than a bespoke enum: a space
//! (which subsystem) and a code (which failure), exactly like the rest of this error space's
//! users. Values 0x80 and above are implementation-specific, so this crate claims two of them.

use wasefire_error::{CodeParam, Error, SpaceParam};

/// Error spaces claimed by this crate.
#[repr(u8)]
pub enum StoreSpace {
    /// Errors reported to callers of [`crate::Store`].
    Store = 0x90,

    /// Errors raised by [`crate::testing::BufferStorage`].
    ///
    /// These never escape [`crate::Store::save`]: the wear-leveling loop consumes them and only
    /// ever reports [`StoreCode::Full`] once the region itself is exhausted.
    Flash = 0x91,
}

impl From<StoreSpace> for u8 {
    fn from(value: StoreSpace) -> Self {
        value as u8
    }
}

impl SpaceParam for StoreSpace {}

/// Error codes reported to callers of [`crate::Store`].
#[repr(u16)]
pub enum StoreCode {
    /// The key is empty, contains `=`, or (for `del`) was not found.
    NameError = 1,

    /// `create` collided with an existing key.
    NameExists = 2,

    /// There is no room for the record, or the region has no migration slot left.
    Full = 3,
}

impl From<StoreCode> for u16 {
    fn from(value: StoreCode) -> Self {
        value as u16
    }
}

impl CodeParam for StoreCode {}

/// Error codes raised internally by a fault-injecting [`crate::Storage`] test double.
#[repr(u16)]
pub enum FlashCode {
    EraseErr = 1,
    WriteErr = 2,
}

impl From<FlashCode> for u16 {
    fn from(value: FlashCode) -> Self {
        value as u16
    }
}

impl CodeParam for FlashCode {}

pub(crate) fn name_error() -> Error {
    Error::new(StoreSpace::Store, StoreCode::NameError)
}

pub(crate) fn name_exists() -> Error {
    Error::new(StoreSpace::Store, StoreCode::NameExists)
}

pub(crate) fn full() -> Error {
    Error::new(StoreSpace::Store, StoreCode::Full)
}
