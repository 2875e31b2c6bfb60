//! error.rs - DiceMix client errors

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

use dicemix_crypto::CryptoError;
use failure::Fail;

/// Every error here terminates the current run.
#[derive(Debug, Fail)]
pub enum DiceMixError {
    #[fail(display = "Relay error: {}", _0)]
    RelayError(String),
    #[fail(display = "Duplicate peer id: {}", _0)]
    DuplicatePeer(i32),
    #[fail(display = "Too many peers: expected at most {}, got {}", _0, _1)]
    TooManyPeers(usize, usize),
    #[fail(display = "Peer list mismatch: expected {} peers, got {}", _0, _1)]
    PeerCountMismatch(usize, usize),
    #[fail(display = "Limit exceeded: {} messages in a run, max={}", _0, _1)]
    TooManyMessages(usize, usize),
    #[fail(display = "Invalid number of roots: expected={}, got={}", _0, _1)]
    RootCountMismatch(usize, usize),
    #[fail(display = "Invalid number of final messages: expected={}, got={}", _0, _1)]
    MessageCountMismatch(usize, usize),
    #[fail(display = "Unexpected response {} in state {}", _1, _0)]
    UnexpectedResponse(String, String),
    #[fail(display = "Invalid message: {}", _0)]
    InvalidMessage(String),
    #[fail(display = "Timed out waiting for the relay")]
    Timeout,
    #[fail(display = "Connection closed: {}", _0)]
    ConnectionClosed(String),
    #[fail(display = "Transport failure: {}", _0)]
    Transport(String),
    #[fail(display = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[fail(display = "Crypto error: {}", _0)]
    Crypto(#[cause] CryptoError),
}

impl From<CryptoError> for DiceMixError {
    fn from(error: CryptoError) -> DiceMixError {
        match error {
            CryptoError::TooManyMessages(got, max) => DiceMixError::TooManyMessages(got, max),
            CryptoError::RootCountMismatch(expected, got) => {
                DiceMixError::RootCountMismatch(expected, got)
            }
            e => DiceMixError::Crypto(e),
        }
    }
}

impl From<failure::Error> for DiceMixError {
    fn from(error: failure::Error) -> DiceMixError {
        DiceMixError::InvalidMessage(error.to_string())
    }
}
