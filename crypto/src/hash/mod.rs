//
// Copyright (c) 2019 Stegos AG
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use crate::utils::u8v_to_typed_str;
use fnv::FnvHasher;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::hash::Hasher as _;

// -----------------------------------------------------
// Hashing with SHA3

pub const HASH_SIZE: usize = 32;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub fn base_vector(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn to_str(&self) -> String {
        u8v_to_typed_str("H", self.base_vector())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Implementation of default crypto-hashing algorithm for this project.
pub struct Hasher(Sha3_256);

impl Hasher {
    /// Create the new hasher.
    pub fn new() -> Self {
        Hasher(Sha3_256::new())
    }

    /// Retrieve result.
    pub fn result(&self) -> Hash {
        let ga = self.0.clone().result();
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(ga.as_slice());
        Hash(h)
    }

    /// Digest input.
    #[inline]
    pub fn input<B: AsRef<[u8]>>(&mut self, data: B) {
        self.0.input(data);
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Hasher::new()
    }
}

/// A hashable type.
///
/// Types implementing Hashable are able to be hashed.
///
pub trait Hashable {
    /// Feeds this value into Hasher.
    fn hash(&self, state: &mut Hasher);
}

impl Hashable for str {
    fn hash(&self, state: &mut Hasher) {
        state.input(self.as_bytes());
    }
}

impl Hashable for [u8] {
    fn hash(&self, state: &mut Hasher) {
        state.input(self)
    }
}

// -----------------------------------------------------
// Short (non-cryptographic) message hashes.
//
// DC-EXP sums powers of these values in the field, and the relay hands them
// back as roots. Collisions are tolerated: a colliding message just fails
// slot reservation.

/// FNV-1a 64 of the message bytes.
pub fn short_hash(msg: &[u8]) -> u64 {
    let mut state = FnvHasher::default();
    state.write(msg);
    state.finish()
}
