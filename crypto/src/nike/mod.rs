//! nike/mod.rs - Non-interactive key exchange on Curve25519

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

use crate::utils::{to_fixed_bytes, u8v_to_typed_str};
use crate::CryptoError;
use rand::{thread_rng, RngCore};
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};

pub const NIKE_KEY_SIZE: usize = 32;

/// Ephemeral (per run) key exchange keypair.
///
/// The secret half is revealed to the relay when a run goes to blame, so
/// it is a `StaticSecret` rather than a one-shot ephemeral secret.
pub struct NikeKeyPair {
    skey: StaticSecret,
    pkey: PublicKey,
}

impl NikeKeyPair {
    pub fn generate() -> NikeKeyPair {
        let mut bytes = [0u8; NIKE_KEY_SIZE];
        thread_rng().fill_bytes(&mut bytes);
        Self::from_secret(bytes)
    }

    pub fn from_secret(bytes: [u8; NIKE_KEY_SIZE]) -> NikeKeyPair {
        let skey = StaticSecret::from(bytes);
        let pkey = PublicKey::from(&skey);
        NikeKeyPair { skey, pkey }
    }

    pub fn try_from_secret_bytes(bytes: &[u8]) -> Result<NikeKeyPair, CryptoError> {
        let bytes: [u8; NIKE_KEY_SIZE] = to_fixed_bytes(bytes)?;
        Ok(Self::from_secret(bytes))
    }

    pub fn public_bytes(&self) -> Vec<u8> {
        self.pkey.as_bytes().to_vec()
    }

    pub fn secret_bytes(&self) -> Vec<u8> {
        self.skey.to_bytes().to_vec()
    }

    /// Diffie-Hellman with a peer's marshalled public key.
    pub fn shared_secret(&self, peer_pkey: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let peer_pkey: [u8; NIKE_KEY_SIZE] = to_fixed_bytes(peer_pkey)?;
        let shared = self.skey.diffie_hellman(&PublicKey::from(peer_pkey));
        // low-order point
        if shared.as_bytes().iter().all(|b| *b == 0) {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(shared.as_bytes().to_vec())
    }
}

impl fmt::Debug for NikeKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", u8v_to_typed_str("KEPK", self.pkey.as_bytes()))
    }
}
