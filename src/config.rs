// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Missing or
//! invalid required values are fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KEYCLOAK_BASE_URL` | Keycloak base URL (e.g. `https://id.example.com`) | Required |
//! | `KEYCLOAK_REALM` | Realm name | Required |
//! | `KEYCLOAK_CLIENT_ID` | Client id; also the expected token audience | Required |
//! | `KEYCLOAK_JWKS_URL` | JWKS endpoint | Derived from base URL + realm |
//! | `JWT_ALGORITHM` | Expected token signing algorithm | `RS256` |
//! | `ALLOWED_ORIGIN` | CORS origin | Permissive when unset |
//! | `DATA_DIR` | Directory for the embedded user store | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

/// Environment variable name for the Keycloak base URL.
pub const KEYCLOAK_BASE_URL_ENV: &str = "KEYCLOAK_BASE_URL";

/// Environment variable name for the realm.
pub const KEYCLOAK_REALM_ENV: &str = "KEYCLOAK_REALM";

/// Environment variable name for the client id (expected audience).
pub const KEYCLOAK_CLIENT_ID_ENV: &str = "KEYCLOAK_CLIENT_ID";

/// Environment variable name for an explicit JWKS URL override.
pub const KEYCLOAK_JWKS_URL_ENV: &str = "KEYCLOAK_JWKS_URL";

/// Environment variable name for the expected signing algorithm.
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";

/// Environment variable name for the allowed CORS origin.
pub const ALLOWED_ORIGIN_ENV: &str = "ALLOWED_ORIGIN";

/// Environment variable name for the user store directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Configuration errors. All variants are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("unsupported signing algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Keycloak base URL.
    pub base_url: Url,
    /// Realm name.
    pub realm: String,
    /// Client id; doubles as the expected token audience.
    pub client_id: String,
    /// JWKS endpoint URL.
    pub jwks_url: String,
    /// Expected token issuer (`{base_url}/realms/{realm}`).
    pub issuer: String,
    /// Expected token signing algorithm.
    pub algorithm: Algorithm,
    /// Allowed CORS origin, if restricted.
    pub allowed_origin: Option<String>,
    /// Directory holding the embedded user store.
    pub data_dir: PathBuf,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let base_url = required(KEYCLOAK_BASE_URL_ENV)?;
        let base_url = Url::parse(&base_url).map_err(|source| ConfigError::InvalidUrl {
            var: KEYCLOAK_BASE_URL_ENV,
            source,
        })?;
        let realm = required(KEYCLOAK_REALM_ENV)?;
        let client_id = required(KEYCLOAK_CLIENT_ID_ENV)?;

        let issuer = derive_issuer(&base_url, &realm);
        let jwks_url = match env::var(KEYCLOAK_JWKS_URL_ENV) {
            Ok(url) => url,
            Err(_) => derive_jwks_url(&issuer),
        };

        let algorithm = match env::var(JWT_ALGORITHM_ENV) {
            Ok(alg) => parse_algorithm(&alg)?,
            Err(_) => Algorithm::RS256,
        };

        let port_str = env::var(PORT_ENV).unwrap_or_else(|_| "8080".to_string());
        let port: u16 = port_str
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_str))?;

        Ok(Self {
            base_url,
            realm,
            client_id,
            jwks_url,
            issuer,
            algorithm,
            allowed_origin: env::var(ALLOWED_ORIGIN_ENV).ok(),
            data_dir: PathBuf::from(env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string())),
            host: env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

/// Derive the realm issuer URL from the base URL and realm name.
pub fn derive_issuer(base_url: &Url, realm: &str) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    format!("{base}/realms/{realm}")
}

/// Derive the JWKS endpoint from the realm issuer URL.
pub fn derive_jwks_url(issuer: &str) -> String {
    format!("{issuer}/protocol/openid-connect/certs")
}

/// Parse a signing algorithm name (e.g. `RS256`).
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    Algorithm::from_str(name.trim()).map_err(|_| ConfigError::InvalidAlgorithm(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_is_base_plus_realm() {
        let base = Url::parse("https://id.example.com").unwrap();
        assert_eq!(
            derive_issuer(&base, "myrealm"),
            "https://id.example.com/realms/myrealm"
        );
    }

    #[test]
    fn issuer_strips_trailing_slash() {
        let base = Url::parse("https://id.example.com/").unwrap();
        assert_eq!(
            derive_issuer(&base, "myrealm"),
            "https://id.example.com/realms/myrealm"
        );
    }

    #[test]
    fn jwks_url_is_openid_connect_certs() {
        assert_eq!(
            derive_jwks_url("https://id.example.com/realms/myrealm"),
            "https://id.example.com/realms/myrealm/protocol/openid-connect/certs"
        );
    }

    #[test]
    fn parse_algorithm_accepts_rs256() {
        assert_eq!(parse_algorithm("RS256").unwrap(), Algorithm::RS256);
        assert_eq!(parse_algorithm(" ES256 ").unwrap(), Algorithm::ES256);
    }

    #[test]
    fn parse_algorithm_rejects_unknown() {
        assert!(matches!(
            parse_algorithm("none"),
            Err(ConfigError::InvalidAlgorithm(_))
        ));
    }
}
