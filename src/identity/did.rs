// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 signing keys and the `did:nil` identities derived from them.

use std::fmt;

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::IdentityError;

/// Method prefix of every identity string.
pub const DID_PREFIX: &str = "did:nil:";

/// Length of a raw private key.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Public identity of a principal: `did:nil:<hex compressed public key>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "did:nil:02a1b2...")]
pub struct Did(String);

impl Did {
    /// Build the identity for a verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        Did(format!("{DID_PREFIX}{}", hex::encode(point.as_bytes())))
    }

    /// Parse and validate an identity string.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        let did = Did(value.to_string());
        did.verifying_key()?;
        Ok(did)
    }

    /// Recover the public key this identity names.
    pub fn verifying_key(&self) -> Result<VerifyingKey, IdentityError> {
        let encoded = self
            .0
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| IdentityError::InvalidDid(self.0.clone()))?;
        let bytes = hex::decode(encoded).map_err(|_| IdentityError::InvalidDid(self.0.clone()))?;
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| IdentityError::InvalidDid(self.0.clone()))
    }

    /// Check a signature made by this identity's key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let key = self.verifying_key()?;
        let signature =
            Signature::from_slice(signature).map_err(|_| IdentityError::InvalidSignature)?;
        key.verify(message, &signature)
            .map_err(|_| IdentityError::InvalidSignature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Did::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// A principal's secret signing key. Never serialized, never logged.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Self {
        PrivateKey(SigningKey::random(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(IdentityError::InvalidKey(format!(
                "expected {PRIVATE_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        SigningKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))
    }

    pub fn from_hex(value: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(value.trim().trim_start_matches("0x"))
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.0.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// ECDSA/SHA-256 signature in fixed 64-byte form.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.0.sign(message);
        signature.to_bytes().to_vec()
    }

    pub fn did(&self) -> Did {
        derive_public_identity(self)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("did", &self.did()).finish_non_exhaustive()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

/// Derive the public identity of a key. Pure, no I/O.
pub fn derive_public_identity(key: &PrivateKey) -> Did {
    Did::from_verifying_key(key.0.verifying_key())
}
