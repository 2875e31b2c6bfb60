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

use crate::CryptoError;

// -------------------------------------------------------------------
// general utility functions

pub fn u8v_to_hexstr(x: &[u8]) -> String {
    hex::encode(x)
}

pub fn u8v_to_typed_str(pref: &str, vec: &[u8]) -> String {
    // produce a type-prefixed hexnum from a byte vector
    format!("{}({})", pref, u8v_to_hexstr(vec))
}

/// Copies a slice into a fixed-size array, checking the length.
pub fn to_fixed_bytes<A>(bytes: &[u8]) -> Result<A, CryptoError>
where
    A: Default + AsMut<[u8]>,
{
    let mut out = A::default();
    let expected = out.as_mut().len();
    if bytes.len() != expected {
        return Err(CryptoError::InvalidBinaryLength(expected, bytes.len()));
    }
    out.as_mut().copy_from_slice(bytes);
    Ok(out)
}

/// dst := dst XOR src, over the shorter of the two.
pub fn xor_bytes(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= *s;
    }
}
