//! HTTP route handlers for the tweet refiner service.
//!
//! This module contains the route handlers that resolve the caller's session from
//! its cookie, turn form posts into session [`Action`]s and render the page.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use cookie::{Cookie, SameSite};
use log::{debug, error};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::refiner::TweetRefiner;
use crate::session::{apply_action, Action, Session, SessionStore};
use crate::view::render_page;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "tweet_refiner_session";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub refiner: Arc<TweetRefiner>,
    pub sessions: Arc<SessionStore>,
}

/// Form posted by the initial "Refine" button.
#[derive(Debug, Deserialize)]
pub struct RefineForm {
    #[serde(default)]
    pub text: String,
}

/// Form posted by the buttons of the active draft.
#[derive(Debug, Deserialize)]
pub struct DraftForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Builds the router with every route of the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/refine", post(handle_refine))
        .route("/drafts/:index/edit", post(handle_edit))
        .route("/drafts/:index/refine", post(handle_refine_again))
        .route("/drafts/:index/approve", post(handle_approve))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Reads the session id from the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

fn session_cookie(id: &str) -> String {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

/// Looks up the live session named by the request's cookie, if any.
async fn find_session(state: &AppState, headers: &HeaderMap) -> Option<Arc<Mutex<Session>>> {
    let id = session_id_from_headers(headers)?;
    let session = state.sessions.get(&id).await;
    if session.is_none() {
        debug!("Session cookie refers to an unknown or expired session");
    }
    session
}

/// Finds the caller's session, creating one if the cookie is missing or stale.
///
/// Only form posts create sessions, so the store holds one entry per browser that
/// actually submitted something. The second element is the id of a newly created
/// session, which the response must hand back in a `Set-Cookie` header.
async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(Arc<Mutex<Session>>, Option<String>), Response> {
    if let Some(session) = find_session(state, headers).await {
        return Ok((session, None));
    }

    match state.sessions.create().await {
        Ok((id, session)) => Ok((session, Some(id))),
        Err(e) => {
            error!("Failed to create session: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response())
        }
    }
}

fn with_session_cookie(mut response: Response, new_session_id: Option<String>) -> Response {
    if let Some(id) = new_session_id {
        match HeaderValue::from_str(&session_cookie(&id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to build session cookie: {}", e),
        }
    }
    response
}

/// Applies actions in order, stopping at the first one that is rejected or fails,
/// then redirects back to the page.
async fn dispatch(state: &AppState, headers: &HeaderMap, actions: Vec<Action>) -> Response {
    let (session, new_id) = match resolve_session(state, headers).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    {
        let mut session = session.lock().await;
        for action in actions {
            if !apply_action(&state.refiner, &mut session, action).await {
                break;
            }
        }
    }

    with_session_cookie(Redirect::to("/").into_response(), new_id)
}

/// Handles GET requests to the root `/` endpoint.
///
/// Renders the page for the caller's session. A pending notice is shown once and
/// then cleared. Without a live session an empty page is rendered and nothing is
/// stored; the session is created by the first form post.
pub async fn handle_index(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let html = match find_session(&state, &headers).await {
        Some(session) => {
            let mut session = session.lock().await;
            let notice = session.take_notice();
            render_page(&session, notice.as_ref())
        }
        None => render_page(&Session::new(), None),
    };
    Html(html)
}

/// Handles POST requests to `/refine`: the first refinement of the original input.
pub async fn handle_refine(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RefineForm>,
) -> Response {
    let action = Action::RefineRequested {
        draft: None,
        text: form.text,
        instructions: None,
    };
    dispatch(&state, &headers, vec![action]).await
}

/// Handles POST requests to `/drafts/:index/edit`: saves the edit box of the active draft.
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
    Form(form): Form<DraftForm>,
) -> Response {
    let action = Action::TextEdited {
        index,
        text: form.text,
    };
    dispatch(&state, &headers, vec![action]).await
}

/// Handles POST requests to `/drafts/:index/refine` ("Refine Again").
///
/// The edited text of the active draft is saved, then refined with the optional
/// additional instructions.
pub async fn handle_refine_again(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
    Form(form): Form<DraftForm>,
) -> Response {
    let actions = vec![
        Action::TextEdited {
            index,
            text: form.text.clone(),
        },
        Action::RefineRequested {
            draft: Some(index),
            text: form.text,
            instructions: form.instructions,
        },
    ];
    dispatch(&state, &headers, actions).await
}

/// Handles POST requests to `/drafts/:index/approve` ("Approve and Post").
pub async fn handle_approve(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
    Form(form): Form<DraftForm>,
) -> Response {
    let actions = vec![
        Action::TextEdited {
            index,
            text: form.text.clone(),
        },
        Action::ApproveRequested {
            index,
            text: form.text,
        },
    ];
    dispatch(&state, &headers, actions).await
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "tweet-refiner"
/// }
/// ```
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "tweet-refiner"}))
}
