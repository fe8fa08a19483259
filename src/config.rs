use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::enums::Role;

/// Application-level constants
pub const APP_NAME: &str = "AfyaLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> String {
    "info,afyalink=debug".to_string()
}

/// Server configuration, read from the environment (a local `.env` file is
/// loaded by the binary before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Registration codes: shared secrets that, at signup, determine the
    /// requested role. Format: `code=role,code=role`.
    registration_codes: Vec<(String, Role)>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("AFYALINK_BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:8080".parse().expect("static addr"));

        let db_path = env::var("AFYALINK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("afyalink.db"));

        let jwt_secret = env::var("AFYALINK_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("AFYALINK_JWT_SECRET not set, using an insecure development secret");
            "afyalink-dev-secret".to_string()
        });

        let token_ttl_secs = env::var("AFYALINK_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let registration_codes = env::var("AFYALINK_REGISTRATION_CODES")
            .map(|v| parse_registration_codes(&v))
            .unwrap_or_default();

        Self {
            bind_addr,
            db_path,
            jwt_secret,
            token_ttl_secs,
            registration_codes,
        }
    }

    /// Test configuration: in-memory-ish defaults, one doctor code.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".parse().expect("static addr"),
            db_path: PathBuf::from(":memory:"),
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
            registration_codes: vec![
                ("DOC-2024".into(), Role::Doctor),
                ("NURSE-2024".into(), Role::Nurse),
            ],
        }
    }

    /// Resolve a signup registration code to the role it requests.
    pub fn role_for_code(&self, code: &str) -> Option<Role> {
        self.registration_codes
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, role)| *role)
    }
}

fn parse_registration_codes(raw: &str) -> Vec<(String, Role)> {
    raw.split(',')
        .filter_map(|pair| {
            let (code, role) = pair.split_once('=')?;
            let code = code.trim();
            if code.is_empty() {
                return None;
            }
            match Role::from_str(role.trim()) {
                Ok(role) => Some((code.to_string(), role)),
                Err(_) => {
                    tracing::warn!("ignoring registration code with unknown role: {role}");
                    None
                }
            }
        })
        .collect()
}
