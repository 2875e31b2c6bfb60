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

//!
//! Protobuf converting trait.
//!

use failure::{Error, Fail};
use protobuf::Message as ProtobufMessage;

/// Structural problems found while converting a decoded protobuf packet.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum ProtoError {
    #[fail(display = "Missing field '{}' in packet '{}'.", _1, _0)]
    MissingField(String, String),
    #[fail(
        display = "Invalid length of field '{}': expected={}, got={}.",
        _0, _1, _2
    )]
    InvalidLength(String, usize, usize),
}

///
/// `ProtoConvert` turns a generated protobuf structure into a validated rust
/// structure and back. Conversion from protobuf must reject packets with
/// missing or malformed fields instead of filling in defaults.
///
pub trait ProtoConvert: Sized {
    type Proto: ProtobufMessage + Sized;
    /// Converts from rust structure to generated protobuf structure.
    fn into_proto(&self) -> Self::Proto;
    /// Converts from protobuf generated structure to rust structure.
    fn from_proto(proto: &Self::Proto) -> Result<Self, Error>;

    /// Decodes a wire buffer.
    fn from_buffer(buffer: &[u8]) -> Result<Self, Error> {
        let proto: Self::Proto = protobuf::parse_from_bytes(buffer)?;
        Self::from_proto(&proto)
    }

    /// Encodes into a wire buffer.
    fn into_buffer(&self) -> Result<Vec<u8>, Error> {
        let proto = self.into_proto();
        let data = proto.write_to_bytes()?;
        Ok(data)
    }
}
