//! Request metadata recorded alongside audit entries.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, Extensions, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Who made the request and what they asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    pub url: Option<String>,
    pub client_ip: IpAddr,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            url: Some(parts.uri.to_string()),
            client_ip: client_ip(&parts.headers, &parts.extensions),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Client IP: first `X-Forwarded-For` hop, then the socket peer.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> IpAddr {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
