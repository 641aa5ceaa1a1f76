use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::events::{Event, EventKind};
use crate::packet::reader::{has_frame, read_frame};
use crate::packet::{out, PacketReader};
use crate::session::Session;
use crate::state::AppState;

/// Response header carrying the session token back to the client.
const CHO_TOKEN: &str = "cho-token";

pub async fn index() -> String {
    format!(
        "banchoserver v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA")
    )
}

/// The packet-exchange endpoint. No `osu-token` header means this request
/// is a login; otherwise the body is a run of framed packets from an
/// established session, and the response body is that session's drained
/// outbound queue. The transport contract guarantees at most one in-flight
/// request per session.
pub async fn exchange(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut event = Event::new(EventKind::WebRequest {
        path: "/".to_string(),
    });
    state.events.publish(&mut event);
    if event.is_cancelled() {
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    match headers.get("osu-token").and_then(|v| v.to_str().ok()) {
        None => login(&state, &body).await,
        Some(token) => Ok(packet_exchange(&state, token, &body)),
    }
}

/// Login body: three lines (username, credential digest, client info
/// (`version|timezone|...`). Failures all come back as a login reply
/// packet, never an HTTP error, because that is what the client parses.
async fn login(state: &AppState, body: &[u8]) -> Result<Response, AppError> {
    let Ok(text) = std::str::from_utf8(body) else {
        return Ok(login_failure(out::LOGIN_FAILED));
    };
    let mut lines = text.lines();
    let (Some(username), Some(credential)) = (lines.next(), lines.next()) else {
        return Ok(login_failure(out::LOGIN_FAILED));
    };
    let client_info = lines.next().unwrap_or("");
    let timezone: i8 = client_info
        .split('|')
        .nth(1)
        .and_then(|tz| tz.parse().ok())
        .unwrap_or(0);

    let Some(row) = db::users::get_by_name(&state.db, username).await? else {
        tracing::debug!(username, "login attempt for unknown user");
        return Ok(login_failure(out::LOGIN_FAILED));
    };
    if hash_credentials(credential) != row.password_hash {
        tracing::debug!(username, "login attempt with wrong credentials");
        return Ok(login_failure(out::LOGIN_FAILED));
    }
    if row.banned {
        tracing::info!(username, "login attempt by banned user");
        return Ok(login_failure(out::LOGIN_BANNED));
    }

    let mut event = Event::new(EventKind::Login {
        user_id: row.id as i32,
    });
    state.events.publish(&mut event);
    if event.is_cancelled() {
        return Ok(login_failure(out::LOGIN_FAILED));
    }

    // a relogin replaces the old session so the username key never
    // aliases two live entries
    if let Some(previous) = state.registry.by_name(&row.username) {
        tracing::info!(username = %row.username, "replacing previous session");
        crate::session::disconnect(state, &previous);
    }

    let groups = db::permissions::group_memberships(&state.db, row.id).await?;
    let user = row.to_session_user(timezone);
    let session = Arc::new(Session::new(user, groups, state.now_secs()));
    if let Some(stats) = db::users::stats_for(&state.db, row.id, 0).await? {
        *session.stats.lock().unwrap() = stats;
    }
    state.registry.add(Arc::clone(&session));

    let mask = session.client_permissions(&state.permissions);
    session.enqueue(out::login_reply(session.user.id));
    session.enqueue(out::login_permissions(mask));
    for channel in state.chat.channels() {
        if channel.public {
            session.enqueue(out::channel_available(&channel));
        }
    }
    session.enqueue(out::channel_listing_complete());

    let rank = session.stats.lock().unwrap().rank;
    let own_presence = out::user_presence(&session.user, mask, rank);
    for other in state.registry.snapshot() {
        if other.token == session.token {
            continue;
        }
        other.enqueue(own_presence.clone());
        let other_mask = other.client_permissions(&state.permissions);
        let other_rank = other.stats.lock().unwrap().rank;
        session.enqueue(out::user_presence(&other.user, other_mask, other_rank));
    }

    tracing::info!(
        user_id = session.user.id,
        username = %session.user.username,
        "session established"
    );
    let token = session.token.to_string();
    Ok(([(CHO_TOKEN, token)], flush(&session)).into_response())
}

fn packet_exchange(state: &AppState, token: &str, body: &[u8]) -> Response {
    let session = Uuid::parse_str(token)
        .ok()
        .and_then(|t| state.registry.by_token(&t));
    let Some(session) = session else {
        // stale or bogus token: tell the client to reconnect
        return out::restart(0).to_bytes().into_response();
    };

    let mut reader = PacketReader::new(body);
    while has_frame(&reader) {
        match read_frame(&mut reader) {
            Ok((id, payload)) => state.router.dispatch(state, &session, id, &payload),
            Err(error) => {
                tracing::warn!(
                    user_id = session.user.id,
                    %error,
                    "bad packet frame, dropping rest of request body"
                );
                break;
            }
        }
    }

    let body = flush(&session);
    if body.is_empty() {
        // nothing queued; answer with a ping so the client sees a live
        // conversation
        return out::ping().to_bytes().into_response();
    }
    body.into_response()
}

fn login_failure(code: i32) -> Response {
    ([(CHO_TOKEN, "no".to_string())], out::login_reply(code).to_bytes()).into_response()
}

/// Drain the session's queue into one response body, oldest packet first.
fn flush(session: &Session) -> Vec<u8> {
    let mut body = Vec::new();
    for packet in session.drain() {
        body.extend_from_slice(&packet.to_bytes());
    }
    body
}

/// The client logs in with a digest, not a password; we store and compare
/// its SHA-256.
pub fn hash_credentials(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
