//! OAuth authentication module for Twitter/X API integration.
//!
//! Posting a tweet on behalf of an account requires OAuth 1.0a User Context
//! authentication: every request carries an `Authorization: OAuth ...` header whose
//! signature is an HMAC-SHA1 over the request method, URL and parameters.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

/// The consumer and access-token credentials used to sign a request.
#[derive(Clone, Copy)]
pub struct OAuth1Credentials<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub access_token: &'a str,
    pub access_token_secret: &'a str,
}

/// Percent-encodes a value as required by RFC 5849 section 3.6.
///
/// Only the unreserved characters `A-Z a-z 0-9 - . _ ~` are left as-is.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Builds the signature base string for a request.
///
/// `url` may carry a query string; its pairs are folded into the signed parameters
/// and it is stripped from the base URL, as the OAuth 1.0a rules require.
/// `params` holds every other parameter to sign (`oauth_*` and form-body pairs).
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let parsed = url::Url::parse(url)?;

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    for (k, v) in parsed.query_pairs() {
        encoded.push((percent_encode(&k), percent_encode(&v)));
    }
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let host = parsed.host_str().ok_or("URL has no host")?;
    let base_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    };

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&parameter_string)
    ))
}

/// Signs a base string with HMAC-SHA1 and returns the base64 signature.
pub fn sign(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| format!("Invalid HMAC key: {}", e))?;
    mac.update(base_string.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Generates a random alphanumeric nonce.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Builds the OAuth 1.0a Authorization header with an explicit nonce and timestamp.
///
/// JSON request bodies are not part of the signature; pass form-encoded body pairs in
/// `extra_params` only when the request actually sends them.
///
/// # Format
///
/// ```text
/// OAuth oauth_consumer_key="...", oauth_nonce="...", oauth_signature="...",
///       oauth_signature_method="HMAC-SHA1", oauth_timestamp="...", oauth_token="...",
///       oauth_version="1.0"
/// ```
pub fn build_oauth1_header_with(
    method: &str,
    url: &str,
    credentials: OAuth1Credentials<'_>,
    extra_params: &[(&str, &str)],
    nonce: &str,
    timestamp: i64,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let timestamp = timestamp.to_string();
    let oauth_params = [
        ("oauth_consumer_key", credentials.consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token),
        ("oauth_version", "1.0"),
    ];

    let mut all_params: Vec<(&str, &str)> = oauth_params.to_vec();
    all_params.extend_from_slice(extra_params);

    let base_string = signature_base_string(method, url, &all_params)?;
    let signature = sign(
        &base_string,
        credentials.consumer_secret,
        credentials.access_token_secret,
    )?;

    let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
    header_params.push(("oauth_signature", signature.as_str()));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}

/// Builds the OAuth 1.0a Authorization header for a request made right now.
///
/// # Example
///
/// ```rust
/// use tweet_refiner::oauth::{build_oauth1_header, OAuth1Credentials};
///
/// let credentials = OAuth1Credentials {
///     consumer_key: "key",
///     consumer_secret: "secret",
///     access_token: "token",
///     access_token_secret: "token_secret",
/// };
/// let header = build_oauth1_header("POST", "https://api.x.com/2/tweets", credentials).unwrap();
/// assert!(header.starts_with("OAuth "));
/// assert!(header.contains("oauth_signature=\""));
/// ```
pub fn build_oauth1_header(
    method: &str,
    url: &str,
    credentials: OAuth1Credentials<'_>,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    build_oauth1_header_with(
        method,
        url,
        credentials,
        &[],
        &generate_nonce(),
        chrono::Utc::now().timestamp(),
    )
}
