// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed capability tokens.
//!
//! Wire form: `base64url(header).base64url(claims).base64url(signature)`,
//! unpadded, with header `{"alg":"ES256K","typ":"nuc"}`. The signature is
//! ECDSA secp256k1 over SHA-256 of the first two segments, made by the
//! issuer's key.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::{Did, IdentityError, PrivateKey};

pub const TOKEN_ALGORITHM: &str = "ES256K";
pub const TOKEN_TYPE: &str = "nuc";

/// Command covering every storage operation.
pub const CMD_ROOT: &str = "/nil/db";
/// Command authorizing a single user-owned data write.
pub const CMD_DATA_CREATE: &str = "/nil/db/data/create";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token signer does not match issuer {0}")]
    SignerMismatch(Did),

    #[error("token issued by {actual}, expected {expected}")]
    WrongIssuer { expected: Did, actual: Did },

    #[error("token addressed to {actual}, expected {expected}")]
    WrongAudience { expected: Did, actual: Did },

    #[error("token command {granted} does not cover {requested}")]
    CommandNotCovered { granted: String, requested: String },

    #[error("token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

/// Token body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Signer.
    pub iss: Did,
    /// Principal allowed to use the token.
    pub aud: Did,
    /// Identity the capability is about.
    pub sub: Did,
    pub cmd: String,
    /// Expiry, unix seconds.
    pub exp: i64,
    pub nonce: String,
    /// Hex SHA-256 digests of the tokens this one extends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prf: Vec<String>,
}

/// A signed, encoded token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationToken {
    claims: Claims,
    encoded: String,
}

/// Whether `granted` authorizes `requested` (segment-wise prefix).
pub fn command_covers(granted: &str, requested: &str) -> bool {
    let granted = granted.trim_end_matches('/');
    granted.is_empty()
        || requested == granted
        || requested
            .strip_prefix(granted)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Random 16-byte nonce, hex encoded.
pub fn new_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let bytes = serde_json::to_vec(value).map_err(|e| TokenError::Malformed(e.to_string()))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    Base64UrlUnpadded::decode_vec(segment)
        .map_err(|_| TokenError::Malformed(format!("{what} is not base64url")))
}

impl DelegationToken {
    /// Sign `claims` with the issuer's key.
    pub fn sign(claims: Claims, key: &PrivateKey) -> Result<Self, TokenError> {
        if key.did() != claims.iss {
            return Err(TokenError::SignerMismatch(claims.iss));
        }

        let header = Header {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };
        let signing_input = format!("{}.{}", encode_json(&header)?, encode_json(&claims)?);
        let signature = key.sign(signing_input.as_bytes());
        let encoded = format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        );

        Ok(Self { claims, encoded })
    }

    /// Parse an encoded token and check its signature against `iss`.
    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        let mut parts = encoded.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed("expected three segments".to_string()));
        };

        let header: Header = serde_json::from_slice(&decode_segment(header, "header")?)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        if header.alg != TOKEN_ALGORITHM || header.typ != TOKEN_TYPE {
            return Err(TokenError::Malformed(format!(
                "unsupported header {}/{}",
                header.alg, header.typ
            )));
        }

        let claims: Claims = serde_json::from_slice(&decode_segment(claims, "claims")?)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        let token = Self {
            claims,
            encoded: encoded.to_string(),
        };
        token.check_signature_bytes(&decode_segment(signature, "signature")?)?;
        Ok(token)
    }

    fn signing_input(&self) -> &str {
        match self.encoded.rfind('.') {
            Some(idx) => &self.encoded[..idx],
            None => &self.encoded,
        }
    }

    fn check_signature_bytes(&self, signature: &[u8]) -> Result<(), TokenError> {
        self.claims
            .iss
            .verify(self.signing_input().as_bytes(), signature)
            .map_err(|_| TokenError::InvalidSignature)
    }

    fn check_signature(&self) -> Result<(), TokenError> {
        let signature = self
            .encoded
            .rsplit('.')
            .next()
            .ok_or_else(|| TokenError::Malformed("missing signature".to_string()))?;
        self.check_signature_bytes(&decode_segment(signature, "signature")?)
    }

    /// Full receiver-side check.
    pub fn verify(
        &self,
        expected_issuer: &Did,
        expected_audience: &Did,
        command: &str,
        now: i64,
    ) -> Result<(), TokenError> {
        self.check_signature()?;

        if &self.claims.iss != expected_issuer {
            return Err(TokenError::WrongIssuer {
                expected: expected_issuer.clone(),
                actual: self.claims.iss.clone(),
            });
        }
        if &self.claims.aud != expected_audience {
            return Err(TokenError::WrongAudience {
                expected: expected_audience.clone(),
                actual: self.claims.aud.clone(),
            });
        }
        if !command_covers(&self.claims.cmd, command) {
            return Err(TokenError::CommandNotCovered {
                granted: self.claims.cmd.clone(),
                requested: command.to_string(),
            });
        }
        if self.claims.exp <= now {
            return Err(TokenError::Expired {
                expires_at: self.claims.exp,
                now,
            });
        }
        Ok(())
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// Hex SHA-256 of the encoded token, used in `prf` chains.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.encoded.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(issuer: &PrivateKey, audience: &Did, cmd: &str, exp: i64) -> Claims {
        Claims {
            iss: issuer.did(),
            aud: audience.clone(),
            sub: issuer.did(),
            cmd: cmd.to_string(),
            exp,
            nonce: new_nonce(),
            prf: Vec::new(),
        }
    }

    #[test]
    fn signed_token_decodes_and_verifies() {
        let admin = PrivateKey::generate();
        let user = PrivateKey::generate().did();
        let token =
            DelegationToken::sign(claims_for(&admin, &user, CMD_DATA_CREATE, 2_000), &admin)
                .unwrap();

        let decoded = DelegationToken::decode(token.as_str()).unwrap();
        assert_eq!(decoded, token);
        assert!(decoded
            .verify(&admin.did(), &user, CMD_DATA_CREATE, 1_000)
            .is_ok());
    }

    #[test]
    fn sign_rejects_foreign_issuer() {
        let admin = PrivateKey::generate();
        let other = PrivateKey::generate();
        let claims = claims_for(&admin, &other.did(), CMD_DATA_CREATE, 2_000);
        assert!(matches!(
            DelegationToken::sign(claims, &other),
            Err(TokenError::SignerMismatch(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let admin = PrivateKey::generate();
        let user = PrivateKey::generate().did();
        let token =
            DelegationToken::sign(claims_for(&admin, &user, CMD_DATA_CREATE, 1_000), &admin)
                .unwrap();

        assert!(matches!(
            token.verify(&admin.did(), &user, CMD_DATA_CREATE, 1_000),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn wrong_parties_are_rejected() {
        let admin = PrivateKey::generate();
        let user = PrivateKey::generate().did();
        let stranger = PrivateKey::generate().did();
        let token =
            DelegationToken::sign(claims_for(&admin, &user, CMD_DATA_CREATE, 2_000), &admin)
                .unwrap();

        assert!(matches!(
            token.verify(&stranger, &user, CMD_DATA_CREATE, 0),
            Err(TokenError::WrongIssuer { .. })
        ));
        assert!(matches!(
            token.verify(&admin.did(), &stranger, CMD_DATA_CREATE, 0),
            Err(TokenError::WrongAudience { .. })
        ));
    }

    #[test]
    fn narrower_command_does_not_cover_wider() {
        let admin = PrivateKey::generate();
        let user = PrivateKey::generate().did();
        let token =
            DelegationToken::sign(claims_for(&admin, &user, CMD_DATA_CREATE, 2_000), &admin)
                .unwrap();

        assert!(matches!(
            token.verify(&admin.did(), &user, "/nil/db/data/delete", 0),
            Err(TokenError::CommandNotCovered { .. })
        ));
    }

    #[test]
    fn command_prefixes_are_segment_aware() {
        assert!(command_covers(CMD_ROOT, CMD_DATA_CREATE));
        assert!(command_covers(CMD_DATA_CREATE, CMD_DATA_CREATE));
        assert!(command_covers("/", CMD_DATA_CREATE));
        assert!(!command_covers("/nil/d", CMD_DATA_CREATE));
        assert!(!command_covers(CMD_DATA_CREATE, CMD_ROOT));
    }

    #[test]
    fn tampered_claims_fail_signature() {
        let admin = PrivateKey::generate();
        let user = PrivateKey::generate().did();
        let token =
            DelegationToken::sign(claims_for(&admin, &user, CMD_DATA_CREATE, 2_000), &admin)
                .unwrap();

        let mut forged = claims_for(&admin, &user, CMD_ROOT, 9_999);
        forged.nonce = token.claims().nonce.clone();
        let forged_segment = encode_json(&forged).unwrap();
        let parts: Vec<&str> = token.as_str().split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_segment, parts[2]);

        assert!(matches!(
            DelegationToken::decode(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(
            DelegationToken::decode("only.two"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            DelegationToken::decode("a.b.c.d"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            DelegationToken::decode("!!.??.##"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn digest_is_stable_hex() {
        let admin = PrivateKey::generate();
        let token =
            DelegationToken::sign(claims_for(&admin, &admin.did(), CMD_ROOT, 2_000), &admin)
                .unwrap();
        assert_eq!(token.digest(), token.digest());
        assert_eq!(token.digest().len(), 64);
    }
}
