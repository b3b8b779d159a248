//! # Tweet Refiner Library
//!
//! A Rust web service library for drafting a tweet, refining its wording with an
//! OpenAI model and posting the approved version to Twitter/X using OAuth 1.0a
//! User Context authentication.
//!
//! ## Features
//!
//! - Single-page HTML interface with per-draft character counters
//! - Refinement through the OpenAI Chat Completions API, using earlier drafts as context
//! - Posting through the Twitter/X API v2 with OAuth 1.0a request signing
//! - Per-browser sessions with idle expiry
//! - Structured logging
//! - Health check endpoint
//!
//! ## Configuration
//!
//! The following environment variables are required:
//! - `OPENAI_API_KEY`
//! - `TWITTER_BEARER_TOKEN`, `TWITTER_API_KEY`, `TWITTER_API_KEY_SECRET`
//! - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
//!
//! See [`Config::from_env`] for the optional settings.
//!
//! ## API Endpoints
//!
//! - `GET /`: Renders the page for the caller's session
//! - `POST /refine`: Refines the original input
//! - `POST /drafts/:index/edit`: Saves the edit box of the latest draft
//! - `POST /drafts/:index/refine`: Refines the latest draft again
//! - `POST /drafts/:index/approve`: Posts the latest draft
//! - `GET /health`: Returns service health status

pub mod config;
pub mod handlers;
pub mod llm;
pub mod oauth;
pub mod refiner;
pub mod session;
pub mod twitter;
pub mod view;

// Re-export commonly used types and functions
pub use config::Config;
pub use handlers::{router, AppState};
pub use llm::OpenAiClient;
pub use refiner::{PostResult, Publisher, TextGenerator, TweetRefiner, TWEET_CHAR_LIMIT};
pub use session::{apply_action, Action, Session, SessionStore};
pub use twitter::TwitterClient;
