//! signature/mod.rs - Long-term request signing (secp256k1 ECDSA)

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

use crate::utils::u8v_to_typed_str;
use crate::CryptoError;
use lazy_static::lazy_static;
use rand::{thread_rng, RngCore};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey, Signature};
use sha2::{Digest, Sha256};
use std::fmt;

lazy_static! {
    static ref SECP: Secp256k1<All> = Secp256k1::new();
}

/// Double SHA-256, the digest the relay verifies signatures against.
fn digest(msg: &[u8]) -> Message {
    let first = Sha256::digest(msg);
    let second = Sha256::digest(first.as_slice());
    Message::from_slice(second.as_slice()).expect("32-byte digest")
}

/// Long-term identity key, persists across runs.
#[derive(Clone)]
pub struct SigningKeyPair {
    skey: SecretKey,
    pkey: PublicKey,
}

impl SigningKeyPair {
    pub fn generate() -> SigningKeyPair {
        let mut rng = thread_rng();
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // retry on the negligible chance of a value >= curve order
            if let Ok(kp) = Self::from_secret_bytes(&bytes) {
                return kp;
            }
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<SigningKeyPair, CryptoError> {
        let skey = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        let pkey = PublicKey::from_secret_key(&*SECP, &skey);
        Ok(SigningKeyPair { skey, pkey })
    }

    /// 33-byte compressed public key.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.pkey.serialize().to_vec()
    }

    /// DER-encoded signature; deterministic for a given key and message.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let sig = SECP.sign(&digest(msg), &self.skey);
        sig.serialize_der().to_vec()
    }
}

/// Checks a signature produced by `SigningKeyPair::sign`.
pub fn verify(pkey: &[u8], msg: &[u8], sig: &[u8]) -> bool {
    let pkey = match PublicKey::from_slice(pkey) {
        Ok(pkey) => pkey,
        Err(_) => return false,
    };
    let sig = match Signature::from_der(sig) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    SECP.verify(&digest(msg), &sig, &pkey).is_ok()
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", u8v_to_typed_str("LTPK", &self.pkey.serialize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify() {
        let kp = SigningKeyPair::generate();
        let msg = b"key exchange request";
        let sig = kp.sign(msg);
        assert!(verify(&kp.public_bytes(), msg, &sig));
        assert!(!verify(&kp.public_bytes(), b"other request", &sig));

        let other = SigningKeyPair::generate();
        assert!(!verify(&other.public_bytes(), msg, &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = SigningKeyPair::generate();
        assert_eq!(kp.sign(b"abc"), kp.sign(b"abc"));
        assert_eq!(kp.public_bytes().len(), 33);
    }

    #[test]
    fn rejects_invalid_secret() {
        assert_eq!(
            SigningKeyPair::from_secret_bytes(&[0u8; 32]).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
    }
}
