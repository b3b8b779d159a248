//! Tweet refinement orchestration.
//!
//! [`TweetRefiner`] is the piece of domain logic between the page and the two
//! external services: it turns the current draft, the earlier drafts and optional
//! instructions into a prompt for the text generator, and forwards an approved
//! draft to the publisher.

use async_trait::async_trait;
use std::sync::Arc;

/// Maximum length of a tweet in characters.
pub const TWEET_CHAR_LIMIT: usize = 280;

/// A text-generation backend, e.g. the OpenAI Chat Completions API.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for a prompt. Transport, quota and parsing failures are errors.
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Outcome of a post attempt. A post succeeded when `error` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostResult {
    /// Identifier assigned by the platform
    pub id: Option<String>,
    /// Failure description, if the post was not accepted
    pub error: Option<String>,
}

impl PostResult {
    pub fn success(id: impl Into<String>) -> Self {
        PostResult {
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        PostResult {
            id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A posting backend, e.g. the Twitter/X API. Failures are reported in the result.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn post(&self, text: &str) -> PostResult;
}

/// Composes the refinement prompt.
///
/// Earlier drafts are listed oldest first as context only; blank entries are skipped.
/// Blank instructions are treated as absent.
///
/// # Example
///
/// ```rust
/// use tweet_refiner::refiner::build_prompt;
///
/// let prompt = build_prompt("just released our new feature!!", &[], Some("more playful"));
/// assert!(prompt.contains("280 characters"));
/// assert!(prompt.contains("more playful"));
/// assert!(prompt.ends_with("just released our new feature!!"));
/// ```
pub fn build_prompt(current_text: &str, history: &[String], instructions: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert social media copywriter. Rewrite the tweet below so it is clearer, \
         more engaging and ready to post. The result must be at most {} characters. \
         Respond with the refined tweet text only, without quotes or commentary.",
        TWEET_CHAR_LIMIT
    );

    let previous: Vec<&str> = history
        .iter()
        .map(|draft| draft.trim())
        .filter(|draft| !draft.is_empty())
        .collect();
    if !previous.is_empty() {
        prompt.push_str(
            "\n\nEarlier versions of this tweet, oldest first. Use them as context for the \
             direction the author is taking; do not simply repeat them:",
        );
        for (i, draft) in previous.iter().enumerate() {
            prompt.push_str(&format!("\n{}. {}", i + 1, draft));
        }
    }

    if let Some(instructions) = instructions.map(str::trim).filter(|i| !i.is_empty()) {
        prompt.push_str("\n\nAdditional instructions from the author: ");
        prompt.push_str(instructions);
    }

    prompt.push_str("\n\nTweet to refine:\n");
    prompt.push_str(current_text);
    prompt
}

/// Orchestrates refinement and publishing through the two backends.
#[derive(Clone)]
pub struct TweetRefiner {
    generator: Arc<dyn TextGenerator>,
    publisher: Arc<dyn Publisher>,
}

impl TweetRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>, publisher: Arc<dyn Publisher>) -> Self {
        TweetRefiner {
            generator,
            publisher,
        }
    }

    /// Asks the generator for an improved version of `current_text`.
    ///
    /// The caller must not pass empty text, and is responsible for appending the
    /// result to its history. The generated text is returned exactly as received,
    /// whitespace included. Every call issues a fresh generation request.
    ///
    /// # Errors
    ///
    /// Propagates the generator's error unchanged; nothing is retried.
    pub async fn refine(
        &self,
        current_text: &str,
        history: &[String],
        instructions: Option<&str>,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let prompt = build_prompt(current_text, history, instructions);
        self.generator.generate(&prompt).await
    }

    /// Posts `final_text` as-is and reports whether the platform accepted it.
    ///
    /// No length check happens here; the platform enforces its own limits.
    pub async fn publish(&self, final_text: &str) -> bool {
        self.publisher.post(final_text).await.is_success()
    }
}
