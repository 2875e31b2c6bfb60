//! field/mod.rs - Prime field used by the exponential DC-net

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

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

// -----------------------------------------------------------------
// Fe is an element of the Mersenne field |Fe| = 2^61 - 1.
//
// The relay solves the power sums of message hashes over this field, so
// every participant has to agree on the modulus. Values are always kept
// in canonical form 0 <= v < P.

pub const P: u64 = 0x1FFF_FFFF_FFFF_FFFF; // 2^61 - 1
const BITS: u32 = 61;

#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fe(u64);

#[inline]
fn fold(x: u128) -> u64 {
    // x < 2^122, so two folds bring it below 2P.
    let x = (x & P as u128) + (x >> BITS);
    let x = (x & P as u128) + (x >> BITS);
    let mut r = x as u64;
    if r >= P {
        r -= P;
    }
    r
}

/// Reduces an arbitrary 64-bit value into the field range.
pub fn reduce(value: u64) -> u64 {
    fold(value as u128)
}

impl Fe {
    pub fn new(value: u64) -> Fe {
        Fe(reduce(value))
    }

    pub fn zero() -> Fe {
        Fe(0)
    }

    pub fn one() -> Fe {
        Fe(1)
    }

    /// Canonical residue.
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// self^n by square-and-multiply.
    pub fn pow(self, mut n: u64) -> Fe {
        let mut base = self;
        let mut acc = Fe::one();
        while n > 0 {
            if n & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            n >>= 1;
        }
        acc
    }
}

impl From<u64> for Fe {
    fn from(value: u64) -> Fe {
        Fe::new(value)
    }
}

impl fmt::Debug for Fe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fe({})", self.0)
    }
}

impl fmt::Display for Fe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -------------------------------------------

impl Neg for Fe {
    type Output = Fe;
    fn neg(self) -> Fe {
        if self.0 == 0 {
            self
        } else {
            Fe(P - self.0)
        }
    }
}

impl Add<Fe> for Fe {
    type Output = Fe;
    fn add(self, other: Fe) -> Fe {
        // both < 2^61, no overflow in u64
        let mut r = self.0 + other.0;
        if r >= P {
            r -= P;
        }
        Fe(r)
    }
}

impl AddAssign<Fe> for Fe {
    fn add_assign(&mut self, other: Fe) {
        *self = *self + other
    }
}

impl Sub<Fe> for Fe {
    type Output = Fe;
    fn sub(self, other: Fe) -> Fe {
        self + (-other)
    }
}

impl Mul<Fe> for Fe {
    type Output = Fe;
    fn mul(self, other: Fe) -> Fe {
        Fe(fold(self.0 as u128 * other.0 as u128))
    }
}

impl MulAssign<Fe> for Fe {
    fn mul_assign(&mut self, other: Fe) {
        *self = *self * other
    }
}
