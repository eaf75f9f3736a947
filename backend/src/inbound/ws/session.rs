//! Per-connection WebSocket forwarding loop.
//!
//! Keeps WebSocket framing and heartbeats at the edge. The loop only pushes:
//! change notifications flow outward and the client sends nothing but
//! control frames. The public contract pings every 5s and considers a
//! connection idle after 10s without client traffic.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time;
use tracing::warn;

use crate::domain::ChangeEvent;
use crate::inbound::ws::messages::ChangeNotification;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

enum SessionEnd {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

pub(super) async fn run(
    mut session: Session,
    mut stream: MessageStream,
    mut receiver: broadcast::Receiver<ChangeEvent>,
) {
    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    let end = loop {
        let result = tokio::select! {
            _ = heartbeat.tick() => {
                handle_heartbeat_tick(&mut session, last_heartbeat).await
            }
            event = receiver.recv() => {
                handle_feed_event(&mut session, event).await
            }
            message = stream.recv() => {
                handle_stream_message(&mut session, &mut last_heartbeat, message).await
            }
        };

        if let Err(end) = result {
            break end;
        }
    };

    log_shutdown_reason(&end);
    close_if_needed(session, &end).await;
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: Instant,
) -> Result<(), SessionEnd> {
    if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionEnd::HeartbeatTimeout);
    }

    session.ping(b"").await.map_err(SessionEnd::Network)
}

async fn handle_feed_event(
    session: &mut Session,
    event: Result<ChangeEvent, RecvError>,
) -> Result<(), SessionEnd> {
    let event = match event {
        Ok(event) => event,
        Err(RecvError::Lagged(missed)) => {
            // Dropped events are harmless; the next one triggers a re-fetch.
            warn!(missed, "WebSocket subscriber lagged behind the change feed");
            return Ok(());
        }
        Err(RecvError::Closed) => return Err(SessionEnd::FeedClosed),
    };

    let notification = ChangeNotification::from(event);
    match serde_json::to_string(&notification) {
        Ok(body) => session.text(body).await.map_err(SessionEnd::Network),
        Err(error) => {
            warn!(error = %error, "Failed to serialize change notification");
            Ok(())
        }
    }
}

async fn handle_stream_message(
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionEnd> {
    let Some(message) = message else {
        return Err(SessionEnd::StreamClosed);
    };

    match message {
        Ok(Message::Ping(payload)) => {
            *last_heartbeat = Instant::now();
            session.pong(&payload).await.map_err(SessionEnd::Network)
        }
        Ok(Message::Close(reason)) => Err(SessionEnd::ClientClosed(reason)),
        Ok(_) => {
            // Any client traffic counts as liveness; the payload is ignored.
            *last_heartbeat = Instant::now();
            Ok(())
        }
        Err(error) => Err(SessionEnd::Protocol(error)),
    }
}

fn log_shutdown_reason(end: &SessionEnd) {
    match end {
        SessionEnd::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionEnd::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionEnd::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionEnd::ClientClosed(_) | SessionEnd::StreamClosed | SessionEnd::FeedClosed => {}
    }
}

async fn close_if_needed(session: Session, end: &SessionEnd) {
    let reason = match end {
        SessionEnd::HeartbeatTimeout => Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        }),
        SessionEnd::Protocol(_) => Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        }),
        SessionEnd::FeedClosed => Some(CloseReason {
            code: CloseCode::Away,
            description: Some("server shutting down".to_owned()),
        }),
        SessionEnd::ClientClosed(reason) => reason.clone(),
        SessionEnd::StreamClosed | SessionEnd::Network(_) => return,
    };

    if let Err(error) = session.close(reason).await {
        warn!(error = %error, "Failed to close WebSocket session");
    }
}
