//! keystream/mod.rs - Pairwise deterministic masking streams

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
//

use crate::field::{Fe, P};
use crate::hash::{Hashable, Hasher};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::fmt;

const KEYSTREAM_DOMAIN: &str = "DiceMix keystream";

/// Deterministic generator shared by exactly two peers.
///
/// Both ends build it from the same NIKE shared secret and must draw from
/// it in the same order: all DC-EXP field elements for a run in ascending
/// slot order, then all DC-SIMPLE pads in ascending slot order. Any other
/// interleaving desynchronizes the pair and the masks no longer cancel.
/// Draws take `&mut self`, so one instance cannot be consumed concurrently.
pub struct DiceMixRng {
    rng: ChaCha20Rng,
}

impl DiceMixRng {
    pub fn new(shared_secret: &[u8]) -> DiceMixRng {
        let mut state = Hasher::new();
        KEYSTREAM_DOMAIN.hash(&mut state);
        shared_secret.hash(&mut state);
        let seed = state.result().bits();
        DiceMixRng {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Next `n` pseudorandom bytes.
    pub fn bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.rng.fill_bytes(&mut out);
        out
    }

    /// Next uniformly distributed field element.
    pub fn field_element(&mut self) -> Fe {
        loop {
            let v = self.rng.next_u64() & P;
            // the only 61-bit value outside the field
            if v != P {
                return Fe::new(v);
            }
        }
    }
}

impl fmt::Debug for DiceMixRng {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DiceMixRng(..)")
    }
}
