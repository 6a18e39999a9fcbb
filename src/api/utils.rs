use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;

use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

const UNKNOWN_CLIENT: &str = "unknown";

/// Identifies the caller for rate limiting. This is the peer IP
/// address unless the server is configured to trust the first entry
/// of `X-Forwarded-For`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn client_id(parts: &Parts, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_for(parts) {
            return ip;
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

impl FromRequestParts<SharedState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let trust_forwarded_for = state
            .read()
            .expect("Unable to read share state")
            .config
            .trust_forwarded_for;
        Ok(ClientId(client_id(parts, trust_forwarded_for)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts(forwarded: Option<&str>, peer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/chat");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(addr) = peer {
            parts
                .extensions
                .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        }
        parts
    }

    #[test]
    fn it_uses_the_peer_address() {
        let parts = parts(Some("1.1.1.1"), Some("10.0.0.7:5555"));
        assert_eq!(client_id(&parts, false), "10.0.0.7");
    }

    #[test]
    fn it_uses_the_first_forwarded_address_when_trusted() {
        let parts = parts(Some(" 203.0.113.9 , 10.0.0.1"), Some("10.0.0.7:5555"));
        assert_eq!(client_id(&parts, true), "203.0.113.9");
    }

    #[test]
    fn it_falls_back_when_nothing_identifies_the_client() {
        assert_eq!(client_id(&parts(None, None), true), UNKNOWN_CLIENT);
        assert_eq!(client_id(&parts(Some(""), None), true), UNKNOWN_CLIENT);
    }
}
