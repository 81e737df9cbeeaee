use std::env;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha512};
use time::Duration;
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::warn;

use super::settings::ConfigError;

/// Signed session layer backing the login endpoint.
pub type SessionLayer = SessionManagerLayer<SqliteStore, SignedCookie>;

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_EMAIL_KEY: &str = "email";

const MIN_SECRET_BYTES: usize = 64;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secure: bool,
    pub same_site: SameSite,
    pub expiry: Duration,
    pub name: String,
    secret: Option<String>,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let production = env::var("ENVIRONMENT").is_ok_and(|value| value == "production");
        let secret = env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty());

        if production {
            if !env_flag_enabled("FORCE_HTTPS") {
                return Err(ConfigError::Insecure(
                    "Production environment requires HTTPS. Set FORCE_HTTPS=true".to_string(),
                ));
            }
            let secret = secret.as_deref().ok_or(ConfigError::Missing("SESSION_SECRET"))?;
            check_secret_strength(secret)?;
        }

        Ok(Self::for_environment(production, secret))
    }

    pub fn for_environment(production: bool, secret: Option<String>) -> Self {
        if production {
            SessionConfig {
                secure: true,
                same_site: SameSite::Strict,
                expiry: Duration::hours(2),
                name: "__Host-accounts-session".to_string(),
                secret,
            }
        } else {
            SessionConfig {
                secure: false,
                same_site: SameSite::Lax,
                expiry: Duration::days(7),
                name: "accounts-session".to_string(),
                secret,
            }
        }
    }

    pub fn create_layer(&self, store: SqliteStore) -> SessionLayer {
        SessionManagerLayer::new(store)
            .with_secure(self.secure)
            .with_http_only(true)
            .with_same_site(self.same_site)
            .with_name(self.name.clone())
            .with_expiry(Expiry::OnInactivity(self.expiry))
            .with_signed(self.signing_key())
    }

    fn signing_key(&self) -> Key {
        match self.secret.as_deref() {
            Some(secret) => key_from_secret_bytes(&decode_secret_bytes(secret)),
            None => {
                warn!("SESSION_SECRET not set; generating ephemeral key (development only)");
                Key::generate()
            }
        }
    }
}

fn check_secret_strength(secret: &str) -> Result<(), ConfigError> {
    if decode_secret_bytes(secret).len() < MIN_SECRET_BYTES {
        return Err(ConfigError::Insecure(format!(
            "SESSION_SECRET must be at least {MIN_SECRET_BYTES} bytes in production"
        )));
    }

    let lowered = secret.to_ascii_lowercase();
    if ["example", "changeme", "default"]
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return Err(ConfigError::Insecure(
            "SESSION_SECRET appears to be a default value".to_string(),
        ));
    }

    Ok(())
}

fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}

fn key_from_secret_bytes(bytes: &[u8]) -> Key {
    match bytes.get(..MIN_SECRET_BYTES) {
        Some(prefix) => Key::from(prefix),
        None => Key::from(Sha512::digest(bytes).as_slice()),
    }
}
