//! Twitter/X API integration module.
//!
//! This module contains the client for posting tweets with the Twitter/X API v2
//! using OAuth 1.0a User Context authentication.

mod api;
mod tweets;

pub use api::sanitize_for_logging;
pub use tweets::TwitterClient;
