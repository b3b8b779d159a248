//! Tweet operations for Twitter API.
//!
//! This module contains the client that posts tweets using the Twitter API v2.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::TwitterConfig;
use crate::oauth::{build_oauth1_header, OAuth1Credentials};
use crate::refiner::{PostResult, Publisher};

use super::api::{api_error_message, sanitize_for_logging};

/// Client for posting tweets on behalf of the configured account.
pub struct TwitterClient {
    http: Client,
    config: TwitterConfig,
    tweets_url: String,
}

impl TwitterClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn from_config(
        config: &TwitterConfig,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(TwitterClient {
            http,
            config: config.clone(),
            tweets_url: format!("{}/2/tweets", config.api_base_url.trim_end_matches('/')),
        })
    }

    fn credentials(&self) -> OAuth1Credentials<'_> {
        OAuth1Credentials {
            consumer_key: &self.config.consumer_key,
            consumer_secret: &self.config.consumer_secret,
            access_token: &self.config.access_token,
            access_token_secret: &self.config.access_token_secret,
        }
    }

    /// Posts a tweet to Twitter/X using the API v2 endpoint.
    ///
    /// # Parameters
    ///
    /// - `text`: The text content of the tweet to post
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The id of the new tweet
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If signing fails, on network error, or
    ///   if the API rejects the tweet (auth, duplicate content, length, rate limit)
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tweet_refiner::{Config, TwitterClient};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let config = Config::from_env().unwrap();
    ///     let client = TwitterClient::from_config(&config.twitter, config.http_timeout).unwrap();
    ///     match client.post_tweet("Hello from Rust!").await {
    ///         Ok(id) => println!("Tweet posted: {}", id),
    ///         Err(e) => eprintln!("Failed to post tweet: {}", e),
    ///     }
    /// }
    /// ```
    pub async fn post_tweet(
        &self,
        text: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Starting tweet post operation ({} chars)",
            text.chars().count()
        );
        debug!("Tweet text: '{}'", sanitize_for_logging(text, 300));

        let payload = json!({ "text": text });

        debug!("Building OAuth 1.0a User Context authorization header");
        let auth_header = build_oauth1_header("POST", &self.tweets_url, self.credentials())?;

        info!("Sending POST request to Twitter API v2");
        debug!("Request URL: {}", self.tweets_url);
        debug!("Request headers: Authorization: OAuth [REDACTED], Content-Type: application/json");

        let response = self
            .http
            .post(&self.tweets_url)
            .header("Authorization", auth_header)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        info!("Received response with status: {}", status);

        if !status.is_success() {
            error!("Tweet posting failed - Status: {}", status);
            debug!("Error response: {}", sanitize_for_logging(&body, 200));
            return Err(format!(
                "Twitter API error ({}): {}",
                status,
                api_error_message(&body)
            )
            .into());
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        match json
            .get("data")
            .and_then(|data| data.get("id"))
            .and_then(|id| id.as_str())
        {
            Some(id) => {
                info!("Tweet posted successfully with id {}", id);
                Ok(id.to_string())
            }
            None => {
                warn!("Twitter API accepted the request but returned no tweet id");
                Err(format!(
                    "Twitter API returned no tweet id: {}",
                    api_error_message(&body)
                )
                .into())
            }
        }
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn post(&self, text: &str) -> PostResult {
        match self.post_tweet(text).await {
            Ok(id) => PostResult::success(id),
            Err(e) => {
                warn!("Failed to post tweet: {}", e);
                PostResult::failure(e.to_string())
            }
        }
    }
}
