//! Client IP resolution for the maintenance whitelist.
//!
//! # Security Warning: Advisory Trust Only
//!
//! **Forwarded headers are taken at face value.** Any client can send its own
//! `X-Forwarded-For` or `X-Real-IP`, so a caller that knows a whitelisted range
//! can claim an address inside it and skip the maintenance page. The whitelist
//! is a convenience for operators, not a security boundary.
//!
//! If that matters for a deployment, put the gate behind a proxy that
//! overwrites (not appends to) these headers:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```
//!
//! # Resolution Order
//!
//! 1. `X-Forwarded-For`: first comma-separated entry, trimmed, if non-empty
//! 2. `X-Real-IP`: used verbatim if non-empty
//! 3. Peer address from `ConnectInfo<SocketAddr>`: host part only
//! 4. [`UNKNOWN_IP`] when the server was not started with connect info
//!
//! The peer address is only present when the router is served with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Fallback value when no client address can be determined.
///
/// Never matches a whitelist range.
pub const UNKNOWN_IP: &str = "unknown";

/// Header carrying the proxy chain, original client first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Header carrying the client address as seen by a single proxy.
pub const X_REAL_IP: &str = "x-real-ip";

/// Where the resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientAddr<'a> {
    FromXff(&'a str),
    FromRealIp(&'a str),
    NotFound,
}

#[inline]
fn client_addr_from_headers<B>(req: &Request<B>) -> ClientAddr<'_> {
    if let Some(forwarded) = req.headers().get(X_FORWARDED_FOR)
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next().map(str::trim)
        && !first_ip.is_empty()
    {
        return ClientAddr::FromXff(first_ip);
    }

    if let Some(real_ip) = req.headers().get(X_REAL_IP)
        && let Ok(value) = real_ip.to_str()
        && !value.is_empty()
    {
        return ClientAddr::FromRealIp(value);
    }

    ClientAddr::NotFound
}

/// Resolve the caller's address for whitelist matching.
///
/// # Example
///
/// ```rust,ignore
/// let client_ip = resolve_client_ip(&req).into_owned();
/// if whitelist.is_whitelisted(&client_ip) { ... }
/// ```
pub fn resolve_client_ip<B>(req: &Request<B>) -> Cow<'static, str> {
    match client_addr_from_headers(req) {
        ClientAddr::FromXff(ip) | ClientAddr::FromRealIp(ip) => Cow::Owned(ip.to_string()),
        ClientAddr::NotFound => match req.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(peer)) => Cow::Owned(peer_host(&peer.to_string()).into_owned()),
            None => Cow::Borrowed(UNKNOWN_IP),
        },
    }
}

/// Host portion of a `host:port` peer address.
///
/// Handles bracketed IPv6 (`[::1]:8080`). Returns the input unchanged when it
/// cannot be split.
pub fn peer_host(peer: &str) -> Cow<'_, str> {
    if let Some(rest) = peer.strip_prefix('[') {
        return match rest.split_once("]:") {
            Some((host, port)) if is_port(port) => Cow::Borrowed(host),
            _ => Cow::Borrowed(peer),
        };
    }

    match peer.rsplit_once(':') {
        // More than one colon without brackets is a bare IPv6 address, not host:port
        Some((host, port)) if !host.contains(':') && is_port(port) => Cow::Borrowed(host),
        _ => Cow::Borrowed(peer),
    }
}

fn is_port(value: &str) -> bool {
    !value.is_empty() && value.parse::<u16>().is_ok()
}
