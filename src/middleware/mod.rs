//! HTTP middleware around the maintenance gate.
//!
//! - **Maintenance**: Tower layer that intercepts requests while maintenance is live
//! - **Client IP**: Resolution from forwarding headers or the peer address
//! - **Whitelist**: CIDR ranges exempt from interception
//! - **Request Timeout**: Client deadline propagated into outbound gate calls
//!
//! # Architecture
//!
//! ```text
//! Request → Request Timeout → Maintenance → Handler → Response
//!                 ↓                ↓
//!            deadline ext    maintenance page (status/content type from config)
//! ```
//!
//! # Security Considerations
//!
//! - Whitelisting trusts `X-Forwarded-For` / `X-Real-IP` as sent; see [`ip`]
//! - Client deadlines can only shorten the configured upstream timeout

pub mod ip;
pub mod maintenance;
pub mod timeout;
pub mod whitelist;

pub use ip::{UNKNOWN_IP, peer_host, resolve_client_ip};
pub use maintenance::{MaintenanceLayer, MaintenanceService};
pub use timeout::{
    MAX_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS, REQUEST_TIMEOUT_HEADER, RequestTimeout,
    RequestTimeoutExt, extract_request_timeout,
};
pub use whitelist::{CidrError, CidrRange, Whitelist};
