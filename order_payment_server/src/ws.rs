//! The realtime channel.
//!
//! Clients open a WebSocket on `/ws`, authenticating with the same access token as the REST API, either in an
//! `Authorization: Bearer` header or in a `token` query parameter (browsers cannot set headers on WebSocket requests).
//! Authentication happens before the upgrade, so a bad token gets a plain 401 and no channel is ever registered.
//!
//! Once connected, every event pushed to the user's registry entry is forwarded as a text frame of the form
//! `{"event": "...", "data": {...}}`. The server pings every [`HEARTBEAT_INTERVAL`] and drops clients that have been
//! silent for longer than [`CLIENT_TIMEOUT`].
use std::{sync::Arc, time::Duration};

use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use order_payment_engine::{
    notifications::{ChannelId, PushEvent},
    ConnectionRegistry,
};
use serde::Deserialize;
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant},
};

use crate::{
    auth::{bearer_token, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Deserialize)]
struct ChannelQuery {
    token: Option<String>,
}

/// The access token for a channel request. The `Authorization` header wins over the query parameter.
pub fn channel_token(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(String::from);
    from_header.or_else(|| {
        web::Query::<ChannelQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().token)
            .filter(|t| !t.is_empty())
    })
}

#[get("/ws")]
pub async fn realtime_channel(
    req: HttpRequest,
    body: web::Payload,
    registry: web::Data<ConnectionRegistry>,
    verifier: web::Data<TokenVerifier>,
) -> Result<HttpResponse, ServerError> {
    let token = channel_token(&req).ok_or_else(|| {
        debug!("📡️ Channel request without an access token");
        AuthError::MissingToken
    })?;
    let claims = verifier.verify(&token)?;
    let (response, session, stream) = actix_ws::handle(&req, body).map_err(|e| {
        debug!("📡️ WebSocket handshake for {} failed. {e}", claims.user_id);
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let (channel_id, events) = registry.register(&claims.user_id);
    let registry = registry.into_inner();
    actix_web::rt::spawn(run_channel(claims.user_id, channel_id, session, stream, events, registry));
    Ok(response)
}

async fn send_event(session: &mut Session, event: &PushEvent) -> Result<(), String> {
    let text = serde_json::to_string(event).map_err(|e| format!("Could not serialize {} event. {e}", event.name()))?;
    session.text(text).await.map_err(|_| "The session is closed".to_string())
}

async fn run_channel(
    user_id: String,
    channel_id: ChannelId,
    mut session: Session,
    mut stream: MessageStream,
    mut events: mpsc::Receiver<PushEvent>,
    registry: Arc<ConnectionRegistry>,
) {
    info!("📡️ Realtime channel {channel_id} open for {user_id}");
    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    let mut last_heard = Instant::now();
    let reason = match send_event(&mut session, &PushEvent::connected(user_id.as_str())).await {
        Err(e) => e,
        Ok(()) => loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        trace!("📡️ Forwarding {} event to {user_id}", event.name());
                        if let Err(e) = send_event(&mut session, &event).await {
                            break e;
                        }
                    },
                    None => break "Superseded by a newer connection".to_string(),
                },
                msg = stream.next() => match msg {
                    Some(Ok(Message::Ping(bytes))) => {
                        last_heard = Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break "The session is closed".to_string();
                        }
                    },
                    Some(Ok(Message::Close(close))) => break format!("Closed by client ({close:?})"),
                    Some(Ok(_)) => last_heard = Instant::now(),
                    Some(Err(e)) => break format!("Protocol error. {e}"),
                    None => break "Connection dropped".to_string(),
                },
                _ = heartbeat.tick() => {
                    if last_heard.elapsed() > CLIENT_TIMEOUT {
                        break format!("No word from the client in {}s", CLIENT_TIMEOUT.as_secs());
                    }
                    if session.ping(b"").await.is_err() {
                        break "The session is closed".to_string();
                    }
                },
            }
        },
    };
    registry.unregister(&user_id, channel_id);
    info!("📡️ Realtime channel {channel_id} for {user_id} closed. {reason}");
    let _ = session.close(None).await;
}
