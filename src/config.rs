//! Configuration module for the tweet refiner service.
//!
//! This module contains the statically typed configuration for the OpenAI and
//! Twitter/X integrations and the HTTP server. Everything is read once at startup
//! from environment variables and validated eagerly.

use log::{debug, error, info};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default OpenAI model used for refinement.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
/// Default sampling temperature.
pub const DEFAULT_OPENAI_TEMPERATURE: f32 = 0.7;
/// Default base URL of the OpenAI API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default base URL of the Twitter/X API.
pub const DEFAULT_TWITTER_API_BASE_URL: &str = "https://api.x.com";
/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default timeout applied by the outbound HTTP clients.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default idle lifetime of a browser session.
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 60;

/// Credentials and settings for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// The API key sent as a Bearer token
    pub api_key: String,
    /// Model name, e.g. `gpt-4o`
    pub model: String,
    /// Sampling temperature in `0.0..=2.0`
    pub temperature: f32,
    /// Base URL without the trailing `/chat/completions`
    pub base_url: String,
}

/// Credentials for the Twitter/X API.
///
/// Posting uses OAuth 1.0a User Context, which needs the consumer key/secret and the
/// access token/secret. The app-only bearer token is required alongside them so that
/// a half-configured deployment is rejected at startup.
#[derive(Clone)]
pub struct TwitterConfig {
    /// App-only Bearer Token from the Twitter Developer Portal
    pub bearer_token: String,
    /// Consumer (API) key
    pub consumer_key: String,
    /// Consumer (API) key secret
    pub consumer_secret: String,
    /// Access token of the posting account
    pub access_token: String,
    /// Access token secret of the posting account
    pub access_token_secret: String,
    /// Base URL of the API, e.g. `https://api.x.com`
    pub api_base_url: String,
}

/// Complete service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub twitter: TwitterConfig,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
    /// Sessions untouched for longer than this are dropped
    pub session_idle: chrono::Duration,
}

/// Masks a secret for logging, keeping at most a short prefix and suffix.
///
/// # Example
///
/// ```rust
/// use tweet_refiner::config::mask_secret;
///
/// assert_eq!(mask_secret("sk-abcdefghijklmnopqrstuvwxyz"), "sk-abcde...stuvwxyz");
/// assert_eq!(mask_secret("short"), "short...");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    let prefix: String = chars.iter().take(8).collect();
    if len > 16 {
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("bearer_token", &mask_secret(&self.bearer_token))
            .field("consumer_key", &mask_secret(&self.consumer_key))
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &mask_secret(&self.access_token))
            .field("access_token_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Collects required values, remembering every missing key so the error can list them all.
struct Required<'a, F> {
    lookup: &'a F,
    missing: Vec<&'static str>,
}

impl<'a, F> Required<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&mut self, key: &'static str) -> String {
        match (self.lookup)(key).filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                info!("Found {} environment variable with length: {}", key, value.len());
                debug!("{} (masked): {}", key, mask_secret(&value));
                value
            }
            None => {
                error!("Missing required environment variable {}", key);
                self.missing.push(key);
                String::new()
            }
        }
    }
}

/// Reads an optional setting, falling back to `default` when unset or blank.
fn optional<F, T>(
    lookup: &F,
    key: &str,
    default: T,
) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for {}: '{}' ({})", key, raw, e).into()),
        None => Ok(default),
    }
}

fn optional_string<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Loads the configuration from process environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `OPENAI_API_KEY`
    /// - `TWITTER_BEARER_TOKEN`
    /// - `TWITTER_API_KEY`, `TWITTER_API_KEY_SECRET`
    /// - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
    ///
    /// # Optional Environment Variables
    ///
    /// - `OPENAI_MODEL` (default `gpt-4o`)
    /// - `OPENAI_TEMPERATURE` (default `0.7`)
    /// - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `TWITTER_API_BASE_URL` (default `https://api.x.com`)
    /// - `PORT` (default `3000`)
    /// - `HTTP_TIMEOUT_SECS` (default `30`, must be positive)
    /// - `SESSION_IDLE_MINUTES` (default `60`, must be positive)
    ///
    /// # Returns
    ///
    /// - `Ok(Config)`: If every required value is present and every optional value parses
    /// - `Err(...)`: Naming all missing variables, or the first invalid optional value
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// [`Config::from_env`] delegates here with `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut required = Required {
            lookup: &lookup,
            missing: Vec::new(),
        };

        let openai_api_key = required.get("OPENAI_API_KEY");
        let bearer_token = required.get("TWITTER_BEARER_TOKEN");
        let consumer_key = required.get("TWITTER_API_KEY");
        let consumer_secret = required.get("TWITTER_API_KEY_SECRET");
        let access_token = required.get("TWITTER_ACCESS_TOKEN");
        let access_token_secret = required.get("TWITTER_ACCESS_TOKEN_SECRET");

        if !required.missing.is_empty() {
            return Err(format!(
                "Missing required environment variables: {}",
                required.missing.join(", ")
            )
            .into());
        }

        let temperature: f32 =
            optional(&lookup, "OPENAI_TEMPERATURE", DEFAULT_OPENAI_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(format!(
                "OPENAI_TEMPERATURE must be between 0.0 and 2.0, got {}",
                temperature
            )
            .into());
        }

        let port = optional(&lookup, "PORT", DEFAULT_PORT)?;
        let timeout_secs: u64 =
            optional(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err("HTTP_TIMEOUT_SECS must be a positive number of seconds, got 0".into());
        }
        let idle_minutes: i64 =
            optional(&lookup, "SESSION_IDLE_MINUTES", DEFAULT_SESSION_IDLE_MINUTES)?;
        let session_idle = chrono::Duration::try_minutes(idle_minutes)
            .filter(|d| *d > chrono::Duration::zero())
            .ok_or_else(|| {
                format!(
                    "SESSION_IDLE_MINUTES must be a positive number of minutes, got {}",
                    idle_minutes
                )
            })?;

        let config = Config {
            openai: OpenAiConfig {
                api_key: openai_api_key,
                model: optional_string(&lookup, "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                temperature,
                base_url: optional_string(&lookup, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
            },
            twitter: TwitterConfig {
                bearer_token,
                consumer_key,
                consumer_secret,
                access_token,
                access_token_secret,
                api_base_url: optional_string(
                    &lookup,
                    "TWITTER_API_BASE_URL",
                    DEFAULT_TWITTER_API_BASE_URL,
                )
                .trim_end_matches('/')
                .to_string(),
            },
            port,
            http_timeout: Duration::from_secs(timeout_secs),
            session_idle,
        };

        info!(
            "Configuration loaded: model {}, temperature {}, port {}",
            config.openai.model, config.openai.temperature, config.port
        );
        Ok(config)
    }
}
