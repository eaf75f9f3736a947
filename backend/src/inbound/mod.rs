//! Inbound adapters driving the domain: REST handlers and the
//! change-notification WebSocket.

pub mod http;
pub mod ws;
