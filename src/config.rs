//! Gateway configuration read from the environment

use crate::filter::HardStopFilter;
use crate::llm::LlmConfig;
use crate::runtime::GovernorConfig;
use chrono::Duration;
use rand::RngCore;
use std::path::PathBuf;

const DEFAULT_TTL_HOURS: i64 = 24;
const DEFAULT_PORT: u16 = 8000;
const GENERATED_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub llm: LlmConfig,
    /// `JWT_SECRET_KEY`; a random per-process key is used when unset
    pub signing_secret: Option<String>,
    /// Credential lifetime when a session reaches the handshake without one
    pub default_ttl_hours: i64,
    /// Drop interrupt-only exchanges from the inference context
    pub exclude_interrupts: bool,
    /// `OECS_HARD_STOP_KEYWORDS`, comma separated; empty means the built-in list
    pub hard_stop_keywords: Vec<String>,
    pub db_path: PathBuf,
    pub port: u16,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("OECS_DB_PATH").map_or_else(
            |_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".oecs").join("sessions.db")
            },
            PathBuf::from,
        );

        Self {
            llm: LlmConfig::from_env(),
            signing_secret: std::env::var("JWT_SECRET_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            default_ttl_hours: std::env::var("OECS_DEFAULT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(DEFAULT_TTL_HOURS),
            exclude_interrupts: std::env::var("OECS_EXCLUDE_INTERRUPTS")
                .ok()
                .is_some_and(|v| parse_flag(&v)),
            hard_stop_keywords: std::env::var("OECS_HARD_STOP_KEYWORDS")
                .map(|v| parse_keywords(&v))
                .unwrap_or_default(),
            db_path,
            port: std::env::var("OECS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    /// Key material for the credential issuer
    pub fn signing_key(&self) -> Vec<u8> {
        if let Some(secret) = &self.signing_secret {
            return secret.as_bytes().to_vec();
        }
        tracing::warn!(
            "JWT_SECRET_KEY not set; using a random per-process key. Credentials will not survive a restart."
        );
        let mut key = vec![0u8; GENERATED_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    pub fn hard_stop_filter(&self) -> HardStopFilter {
        if self.hard_stop_keywords.is_empty() {
            HardStopFilter::default()
        } else {
            HardStopFilter::new(&self.hard_stop_keywords)
        }
    }

    pub fn governor_config(&self) -> GovernorConfig {
        GovernorConfig {
            exclude_interrupts: self.exclude_interrupts,
            default_lifetime: Duration::hours(self.default_ttl_hours),
            ..GovernorConfig::default()
        }
    }
}

fn parse_keywords(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
