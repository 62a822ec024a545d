// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] loaded from the environment at startup (after `.env` has been
//! read by `dotenvy`).
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for vault storage | `/data` |
//! | `APP_ENV` | `production` turns on secure cookies | `development` |
//! | `COOKIE_SECURE` | Force the cookie `Secure` flag | follows `APP_ENV` |
//! | `BUILDER_PRIVATE_KEY` | Hex secp256k1 key of the administrative identity | Required |
//! | `SESSION_SECRET` | Hex cookie signing key (>= 64 bytes) | Derived from builder key |
//! | `ACCOUNT_ID_SECRET` | Hex key for email → account id derivation | Derived from builder key |
//! | `STORE_ENCRYPTION_KEY` | Hex AES-256 key for sealed document fields | Derived from builder key |
//! | `NILAI_API_KEY` | Bearer key for the private LLM | Optional (AI routes fail without it) |
//! | `NILAI_BASE_URL` | Private LLM base URL | `https://nilai-api.nillion.network` |
//! | `NILAI_MODEL` | Completion model | `meta-llama/Llama-3.1-8B-Instruct` |
//! | `DELEGATION_TTL_SECS` | Delegation token lifetime | `3600` |
//! | `ROOT_TOKEN_TTL_SECS` | Administrative root token lifetime | `86400` |
//! | `ROOT_TOKEN_REFRESH_SECS` | Root token refresh interval | `3600` |
//! | `KEY_CACHE_CAPACITY` | Signing keys kept in memory | `1024` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the vault data directory path.
///
/// Collections, documents and the signing key database live here.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const BUILDER_PRIVATE_KEY_ENV: &str = "BUILDER_PRIVATE_KEY";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const ACCOUNT_ID_SECRET_ENV: &str = "ACCOUNT_ID_SECRET";
pub const STORE_ENCRYPTION_KEY_ENV: &str = "STORE_ENCRYPTION_KEY";
pub const NILAI_API_KEY_ENV: &str = "NILAI_API_KEY";
pub const NILAI_BASE_URL_ENV: &str = "NILAI_BASE_URL";
pub const NILAI_MODEL_ENV: &str = "NILAI_MODEL";
pub const DELEGATION_TTL_ENV: &str = "DELEGATION_TTL_SECS";
pub const ROOT_TOKEN_TTL_ENV: &str = "ROOT_TOKEN_TTL_SECS";
pub const ROOT_TOKEN_REFRESH_ENV: &str = "ROOT_TOKEN_REFRESH_SECS";
pub const KEY_CACHE_CAPACITY_ENV: &str = "KEY_CACHE_CAPACITY";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_NILAI_BASE_URL: &str = "https://nilai-api.nillion.network";
pub const DEFAULT_NILAI_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
pub const DEFAULT_DELEGATION_TTL_SECS: u64 = 3600;
pub const DEFAULT_ROOT_TOKEN_TTL_SECS: u64 = 86_400;
pub const DEFAULT_ROOT_TOKEN_REFRESH_SECS: u64 = 3600;
pub const DEFAULT_KEY_CACHE_CAPACITY: usize = 1024;

/// Minimum length of the cookie signing key.
pub const SESSION_SECRET_MIN_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Bounds on collaborator calls.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// One `list_data_references` call.
    pub enumeration: Duration,
    /// One per-note read while listing.
    pub note_fetch: Duration,
    /// The whole notes listing for a request.
    pub listing: Duration,
    /// One mutating store call (create or delete).
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            enumeration: Duration::from_secs(10),
            note_fetch: Duration::from_secs(5),
            listing: Duration::from_secs(30),
            write: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NilaiConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub production: bool,
    pub cookie_secure: bool,
    /// Administrative identity secret key (hex, 32 bytes).
    pub builder_private_key: String,
    pub session_secret: Vec<u8>,
    pub account_id_secret: Vec<u8>,
    pub store_encryption_key: [u8; 32],
    pub nilai: NilaiConfig,
    pub delegation_ttl: Duration,
    pub root_token_ttl: Duration,
    pub root_token_refresh: Duration,
    pub key_cache_capacity: usize,
    pub tls: Option<TlsPaths>,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let builder_private_key = var(BUILDER_PRIVATE_KEY_ENV)
            .ok_or(ConfigError::Missing(BUILDER_PRIVATE_KEY_ENV))?
            .trim()
            .trim_start_matches("0x")
            .to_string();
        let builder_bytes = decode_hex(BUILDER_PRIVATE_KEY_ENV, &builder_private_key)?;
        if builder_bytes.len() != 32 {
            return Err(ConfigError::Invalid {
                name: BUILDER_PRIVATE_KEY_ENV,
                reason: format!("expected 32 bytes, got {}", builder_bytes.len()),
            });
        }

        let port = match var(PORT_ENV) {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("not a port number: {p}"),
            })?,
            None => 8080,
        };

        let production = var(APP_ENV_ENV)
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let cookie_secure = match var(COOKIE_SECURE_ENV) {
            Some(v) => parse_bool(COOKIE_SECURE_ENV, &v)?,
            None => production,
        };

        let session_secret = match var(SESSION_SECRET_ENV) {
            Some(hex_secret) => {
                let bytes = decode_hex(SESSION_SECRET_ENV, &hex_secret)?;
                if bytes.len() < SESSION_SECRET_MIN_LEN {
                    return Err(ConfigError::Invalid {
                        name: SESSION_SECRET_ENV,
                        reason: format!("must be at least {SESSION_SECRET_MIN_LEN} bytes"),
                    });
                }
                bytes
            }
            None => {
                let mut derived = derive_secret(&builder_bytes, b"memoryvault/session/1");
                derived.extend(derive_secret(&builder_bytes, b"memoryvault/session/2"));
                derived
            }
        };

        let account_id_secret = match var(ACCOUNT_ID_SECRET_ENV) {
            Some(hex_secret) => decode_hex(ACCOUNT_ID_SECRET_ENV, &hex_secret)?,
            None => derive_secret(&builder_bytes, b"memoryvault/account-id"),
        };

        let store_encryption_key = match var(STORE_ENCRYPTION_KEY_ENV) {
            Some(hex_key) => {
                let bytes = decode_hex(STORE_ENCRYPTION_KEY_ENV, &hex_key)?;
                <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::Invalid {
                    name: STORE_ENCRYPTION_KEY_ENV,
                    reason: "expected 32 bytes".to_string(),
                })?
            }
            None => {
                let derived = derive_secret(&builder_bytes, b"memoryvault/store-key");
                let mut key = [0u8; 32];
                key.copy_from_slice(&derived);
                key
            }
        };

        let base_url_raw =
            var(NILAI_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_NILAI_BASE_URL.to_string());
        let base_url = Url::parse(&base_url_raw).map_err(|e| ConfigError::Invalid {
            name: NILAI_BASE_URL_ENV,
            reason: e.to_string(),
        })?;

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_PATH_ENV,
                    reason: format!("{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together"),
                })
            }
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            production,
            cookie_secure,
            builder_private_key,
            session_secret,
            account_id_secret,
            store_encryption_key,
            nilai: NilaiConfig {
                api_key: var(NILAI_API_KEY_ENV),
                base_url,
                model: var(NILAI_MODEL_ENV).unwrap_or_else(|| DEFAULT_NILAI_MODEL.to_string()),
            },
            delegation_ttl: Duration::from_secs(parse_u64(
                &var,
                DELEGATION_TTL_ENV,
                DEFAULT_DELEGATION_TTL_SECS,
            )?),
            root_token_ttl: Duration::from_secs(parse_u64(
                &var,
                ROOT_TOKEN_TTL_ENV,
                DEFAULT_ROOT_TOKEN_TTL_SECS,
            )?),
            root_token_refresh: Duration::from_secs(parse_u64(
                &var,
                ROOT_TOKEN_REFRESH_ENV,
                DEFAULT_ROOT_TOKEN_REFRESH_SECS,
            )?),
            key_cache_capacity: parse_u64(
                &var,
                KEY_CACHE_CAPACITY_ENV,
                DEFAULT_KEY_CACHE_CAPACITY as u64,
            )? as usize,
            tls,
            timeouts: Timeouts::default(),
        })
    }

    /// Whether the LLM collaborator has credentials.
    pub fn has_nilai_key(&self) -> bool {
        self.nilai.api_key.is_some()
    }
}

fn decode_hex(name: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    hex::decode(value.trim().trim_start_matches("0x")).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("not a boolean: {other}"),
        }),
    }
}

fn parse_u64(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(name) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("not an unsigned integer: {v}"),
        }),
        None => Ok(default),
    }
}

/// Domain-separated secret derived from the builder key.
fn derive_secret(master: &[u8], label: &[u8]) -> Vec<u8> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(master)
        .expect("HMAC accepts keys of any length");
    mac.update(label);
    mac.finalize().into_bytes().to_vec()
}
