use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub bind_addr: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub gemini_image_fallback_model: String,
    pub gemini_text_model: String,
    pub gemini_temperature: f32,
    pub gemini_max_output_tokens: i32,
    pub gemini_request_timeout_seconds: u64,
    pub gemini_max_retry_attempts: usize,
    pub compose_timeout_seconds: u64,
    pub lexicon_config_path: PathBuf,
    pub card_export_dir: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(value: String) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/').to_string();
    Url::parse(&trimmed).map_err(|err| anyhow!("Invalid GEMINI_BASE_URL '{trimmed}': {err}"))?;
    Ok(trimmed)
}

fn normalize_temperature(value: f32) -> f32 {
    if (0.0..=2.0).contains(&value) {
        return value;
    }
    warn!(
        "GEMINI_TEMPERATURE {} is outside 0.0..=2.0; using 0.7.",
        value
    );
    0.7
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:3000"),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_base_url: normalize_base_url(env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ))?,
            gemini_image_model: env_string(
                "GEMINI_IMAGE_MODEL",
                "gemini-2.0-flash-exp-image-generation",
            ),
            gemini_image_fallback_model: env_string(
                "GEMINI_IMAGE_FALLBACK_MODEL",
                "gemini-2.0-flash-preview-image-generation",
            ),
            gemini_text_model: env_string("GEMINI_TEXT_MODEL", "gemini-2.0-flash"),
            gemini_temperature: normalize_temperature(env_f32("GEMINI_TEMPERATURE", 0.7)),
            gemini_max_output_tokens: env_i32("GEMINI_MAX_OUTPUT_TOKENS", 200).max(1),
            gemini_request_timeout_seconds: env_u64("GEMINI_REQUEST_TIMEOUT_SECONDS", 60).max(1),
            gemini_max_retry_attempts: env_usize("GEMINI_MAX_RETRY_ATTEMPTS", 2).max(1),
            compose_timeout_seconds: env_u64("COMPOSE_TIMEOUT_SECONDS", 120).max(1),
            lexicon_config_path: PathBuf::from(env_string("LEXICON_CONFIG_PATH", "lexicon.json")),
            card_export_dir: PathBuf::from(env_string("CARD_EXPORT_DIR", "cards")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let normalized =
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta/".to_string())
                .unwrap();
        assert_eq!(normalized, "https://generativelanguage.googleapis.com/v1beta");
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        assert!(normalize_base_url("generativelanguage.googleapis.com".to_string()).is_err());
    }

    #[test]
    fn out_of_range_temperature_falls_back() {
        assert_eq!(normalize_temperature(3.5), 0.7);
        assert_eq!(normalize_temperature(0.2), 0.2);
    }
}
