// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level encryption at rest.
//!
//! Any JSON object of the exact shape `{"%allot": "<plaintext>"}` is sealed
//! into `{"%share": "<base64(nonce || ciphertext)>"}` on write and opened
//! back into the plain string on read.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64ct::{Base64, Encoding};
use rand::RngCore;
use serde_json::{Map, Value};

/// Marker for a field to be encrypted.
pub const ALLOT_MARKER: &str = "%allot";
/// Marker for an encrypted field.
pub const SHARE_MARKER: &str = "%share";

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum FieldCryptoError {
    #[error("field encryption failed")]
    Encrypt,

    #[error("field decryption failed")]
    Decrypt,

    #[error("{0} must hold a string")]
    NotAString(&'static str),
}

/// Seals and opens marked fields with one AES-256-GCM key.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher")
    }
}

/// Wrap a plaintext string as a field to be encrypted on write.
pub fn allot(plaintext: impl Into<String>) -> Value {
    let mut map = Map::new();
    map.insert(ALLOT_MARKER.to_string(), Value::String(plaintext.into()));
    Value::Object(map)
}

fn single_marker<'a>(map: &'a Map<String, Value>, marker: &str) -> Option<&'a Value> {
    if map.len() == 1 {
        map.get(marker)
    } else {
        None
    }
}

impl FieldCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    fn seal_str(&self, plaintext: &str) -> Result<String, FieldCryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| FieldCryptoError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(Base64::encode_string(&sealed))
    }

    fn open_str(&self, sealed: &str) -> Result<String, FieldCryptoError> {
        let bytes = Base64::decode_vec(sealed).map_err(|_| FieldCryptoError::Decrypt)?;
        if bytes.len() < NONCE_LEN {
            return Err(FieldCryptoError::Decrypt);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| FieldCryptoError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| FieldCryptoError::Decrypt)
    }

    /// Replace every `%allot` field in `value` with its sealed `%share`.
    pub fn seal(&self, value: &mut Value) -> Result<(), FieldCryptoError> {
        match value {
            Value::Object(map) => {
                if let Some(inner) = single_marker(map, ALLOT_MARKER) {
                    let plaintext = inner
                        .as_str()
                        .ok_or(FieldCryptoError::NotAString(ALLOT_MARKER))?;
                    let sealed = self.seal_str(plaintext)?;
                    let mut share = Map::new();
                    share.insert(SHARE_MARKER.to_string(), Value::String(sealed));
                    *value = Value::Object(share);
                    return Ok(());
                }
                for field in map.values_mut() {
                    self.seal(field)?;
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(|item| self.seal(item)),
            _ => Ok(()),
        }
    }

    /// Replace every `%share` field in `value` with its plaintext string.
    pub fn open(&self, value: &mut Value) -> Result<(), FieldCryptoError> {
        match value {
            Value::Object(map) => {
                if let Some(inner) = single_marker(map, SHARE_MARKER) {
                    let sealed = inner
                        .as_str()
                        .ok_or(FieldCryptoError::NotAString(SHARE_MARKER))?;
                    *value = Value::String(self.open_str(sealed)?);
                    return Ok(());
                }
                for field in map.values_mut() {
                    self.open(field)?;
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(|item| self.open(item)),
            _ => Ok(()),
        }
    }
}
