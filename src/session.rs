//! Per-user editing sessions.
//!
//! A [`Session`] holds the revision history and UI flags of one browser session.
//! User input reaches it as typed [`Action`]s through [`apply_action`], the single
//! place where session state changes. [`SessionStore`] keys sessions by cookie id.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::refiner::TweetRefiner;

/// One revision of the tweet, as returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    content: String,
    ordinal: usize,
}

impl Draft {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// 1-based position in the revision history.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Length in characters (Unicode scalar values), not bytes.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Where a session is in the draft, refine, review, publish cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Drafting,
    Refining,
    Review,
    Publishing,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

pub const MSG_EMPTY_INPUT: &str = "Please enter some text to refine.";
pub const MSG_REFINE_FAILED: &str = "Failed to refine tweet. Please try again.";
pub const MSG_POSTED: &str = "Tweet posted successfully!";
pub const MSG_POST_FAILED: &str = "Failed to post tweet. Please try again.";
pub const MSG_NOT_ACTIVE: &str = "Only the latest draft can be edited, refined or posted.";
pub const MSG_ALREADY_REFINED: &str = "Use \"Refine Again\" on the latest draft.";

/// State of one interactive editing session.
#[derive(Debug, Clone)]
pub struct Session {
    input: String,
    drafts: Vec<Draft>,
    edits: Vec<String>,
    instructions: String,
    awaiting_first_refinement: bool,
    phase: Phase,
    notice: Option<Notice>,
    refinements: usize,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            input: String::new(),
            drafts: Vec::new(),
            edits: Vec::new(),
            instructions: String::new(),
            awaiting_first_refinement: true,
            phase: Phase::Empty,
            notice: None,
            refinements: 0,
        }
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    /// Draft contents oldest first, as passed to the refiner.
    pub fn history(&self) -> Vec<String> {
        self.drafts.iter().map(|d| d.content.clone()).collect()
    }

    /// Index of the only editable draft: the most recent one.
    pub fn active_index(&self) -> Option<usize> {
        self.drafts.len().checked_sub(1)
    }

    pub fn active_draft(&self) -> Option<&Draft> {
        self.drafts.last()
    }

    /// Current text of a draft's edit box.
    pub fn edited_text(&self, index: usize) -> Option<&str> {
        self.edits.get(index).map(String::as_str)
    }

    /// Character count shown under a draft's edit box.
    pub fn char_count(&self, index: usize) -> Option<usize> {
        self.edited_text(index).map(|t| t.chars().count())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn is_awaiting_first_refinement(&self) -> bool {
        self.awaiting_first_refinement
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of successful refinements since the session was created or last reset.
    pub fn refinement_count(&self) -> usize {
        self.refinements
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn push_draft(&mut self, content: String) {
        let ordinal = self.drafts.len() + 1;
        self.edits.push(content.trim().to_string());
        self.drafts.push(Draft { content, ordinal });
        self.refinements += 1;
        self.awaiting_first_refinement = false;
        self.phase = Phase::Review;
    }

    /// Returns the session to its initial state, keeping only the pending notice.
    fn reset(&mut self) {
        let notice = self.notice.take();
        *self = Session::new();
        self.notice = notice;
    }

    /// Phase to fall back to when a refinement fails.
    fn resting_phase(&self) -> Phase {
        if self.drafts.is_empty() {
            if self.input.trim().is_empty() {
                Phase::Empty
            } else {
                Phase::Drafting
            }
        } else {
            Phase::Review
        }
    }
}

/// A user interaction with the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Refine the original input (`draft: None`) or the active draft (`draft: Some(index)`).
    RefineRequested {
        draft: Option<usize>,
        text: String,
        instructions: Option<String>,
    },
    /// The text of a draft's edit box changed.
    TextEdited { index: usize, text: String },
    /// Post `text` as the final version of the draft at `index`.
    ApproveRequested { index: usize, text: String },
}

/// Converts the CRLF (and lone CR) line breaks submitted by browser forms to LF,
/// the form textarea values take in the page script.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Applies one action to the session, calling the refiner where the action needs it.
///
/// Collaborator failures are turned into a notice here and leave the revision
/// history untouched. Returns `false` when the action was rejected or failed, so
/// that callers dispatching several actions can stop early.
pub async fn apply_action(
    refiner: &TweetRefiner,
    session: &mut Session,
    action: Action,
) -> bool {
    match action {
        Action::TextEdited { index, text } => {
            if session.active_index() != Some(index) {
                warn!("Rejected edit of draft {} (not the active draft)", index);
                session.notice = Some(Notice::error(MSG_NOT_ACTIVE));
                return false;
            }
            session.edits[index] = normalize_newlines(&text);
            true
        }
        Action::RefineRequested {
            draft,
            text,
            instructions,
        } => {
            let text = normalize_newlines(&text);
            match draft {
                None if !session.awaiting_first_refinement => {
                    session.notice = Some(Notice::error(MSG_ALREADY_REFINED));
                    return false;
                }
                None => session.input = text.clone(),
                Some(index) if session.active_index() != Some(index) => {
                    warn!("Rejected refinement of draft {} (not the active draft)", index);
                    session.notice = Some(Notice::error(MSG_NOT_ACTIVE));
                    return false;
                }
                Some(_) => {}
            }

            if let Some(instructions) = &instructions {
                session.instructions = instructions.clone();
            }

            if text.trim().is_empty() {
                session.phase = session.resting_phase();
                session.notice = Some(Notice::error(MSG_EMPTY_INPUT));
                return false;
            }

            session.phase = Phase::Refining;
            let history = session.history();
            info!(
                "Refining tweet ({} chars, {} earlier drafts)",
                text.chars().count(),
                history.len()
            );
            match refiner.refine(&text, &history, instructions.as_deref()).await {
                Ok(refined) => {
                    session.push_draft(refined);
                    session.instructions.clear();
                    true
                }
                Err(e) => {
                    warn!("Refinement failed: {}", e);
                    session.phase = session.resting_phase();
                    session.notice = Some(Notice::error(MSG_REFINE_FAILED));
                    false
                }
            }
        }
        Action::ApproveRequested { index, text } => {
            if session.active_index() != Some(index) {
                warn!("Rejected publish of draft {} (not the active draft)", index);
                session.notice = Some(Notice::error(MSG_NOT_ACTIVE));
                return false;
            }
            let text = normalize_newlines(&text);
            session.edits[index] = text.clone();
            session.phase = Phase::Publishing;
            info!("Publishing draft {} ({} chars)", index + 1, text.chars().count());

            if refiner.publish(&text).await {
                session.phase = Phase::Published;
                session.notice = Some(Notice::success(MSG_POSTED));
                session.reset();
                true
            } else {
                warn!("Publishing draft {} failed", index + 1);
                session.phase = Phase::Review;
                session.notice = Some(Notice::error(MSG_POST_FAILED));
                false
            }
        }
    }
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_seen: DateTime<Utc>,
}

/// Sessions keyed by cookie id, dropped after a period of inactivity.
///
/// The map lock is held only for lookups; each session has its own lock, so a
/// slow action in one session never blocks another.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle: chrono::Duration,
}

impl SessionStore {
    pub fn new(idle: chrono::Duration) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            idle,
        }
    }

    /// Generates a random 128-bit session id, hex encoded.
    pub fn generate_id() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| format!("Failed to generate session id: {}", e))?;
        Ok(hex::encode(bytes))
    }

    /// Looks up a live session and marks it as used.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        Self::prune(&mut sessions, now, self.idle);
        sessions.get_mut(id).map(|entry| {
            entry.last_seen = now;
            Arc::clone(&entry.session)
        })
    }

    /// Creates a fresh session and returns its id.
    pub async fn create(
        &self,
    ) -> Result<(String, Arc<Mutex<Session>>), Box<dyn std::error::Error + Send + Sync>> {
        let id = Self::generate_id()?;
        let session = Arc::new(Mutex::new(Session::new()));
        let now = Utc::now();

        let mut sessions = self.sessions.lock().await;
        Self::prune(&mut sessions, now, self.idle);
        sessions.insert(
            id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        info!("Created session ({} active)", sessions.len());
        Ok((id, session))
    }

    /// Drops every session idle since before `now - idle`. Returns how many were dropped.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        Self::prune(&mut sessions, now, self.idle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn prune(
        sessions: &mut HashMap<String, Entry>,
        now: DateTime<Utc>,
        idle: chrono::Duration,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= idle);
        let dropped = before - sessions.len();
        if dropped > 0 {
            info!("Dropped {} idle sessions", dropped);
        }
        dropped
    }
}
