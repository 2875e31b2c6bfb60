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

pub mod dicemix;
pub mod field;
pub mod hash;
pub mod keystream;
pub mod nike;
pub mod signature;
pub mod utils;

use failure::Fail;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum CryptoError {
    /// Trying to coerce from incorrect byte array
    #[fail(
        display = "Invalid binary string length. Expected: {}, Got: {}",
        _0, _1
    )]
    InvalidBinaryLength(usize, usize),
    /// Public key bytes do not decode to a curve point
    #[fail(display = "Invalid public key")]
    InvalidPublicKey,
    /// Secret key bytes are out of range for the curve
    #[fail(display = "Invalid secret key")]
    InvalidSecretKey,
    /// Total slot count exceeds the hard cap
    #[fail(display = "Limit exceeded: {} messages in a run, max={}", _0, _1)]
    TooManyMessages(usize, usize),
    /// Relay returned a roots vector of the wrong size
    #[fail(
        display = "Invalid number of roots: expected={}, got={}",
        _0, _1
    )]
    RootCountMismatch(usize, usize),
    /// Message placed outside the slot vector
    #[fail(display = "Slot {} out of range, total={}", _0, _1)]
    InvalidSlot(usize, usize),
    /// Messages and slot assignments differ in length
    #[fail(display = "Slot assignment mismatch: messages={}, slots={}", _0, _1)]
    SlotCountMismatch(usize, usize),
}
