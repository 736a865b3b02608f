//! Tower adapter that puts a [`MaintenanceGate`] in front of a service.
//!
//! The wrapped (inner) service is the "next" handler: it is called with the
//! original, unmodified request whenever the gate does not intercept.
//!
//! # Example
//!
//! ```rust,ignore
//! let layer = MaintenanceLayer::new(&config.maintenance, "public-site")?;
//! let app = Router::new()
//!     .route("/", get(index))
//!     .layer(layer);
//! ```
//!
//! Serve the router with `into_make_service_with_connect_info::<SocketAddr>()`
//! so that peer addresses are available for whitelist matching when no
//! forwarding headers are present.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};

use super::ip::resolve_client_ip;
use super::timeout::RequestTimeoutExt;
use crate::config::MaintenanceConfig;
use crate::error::AppResult;
use crate::gate::MaintenanceGate;

/// Maintenance layer for Tower middleware stack.
#[derive(Clone, Debug)]
pub struct MaintenanceLayer {
    gate: MaintenanceGate,
}

impl MaintenanceLayer {
    /// Build the gate from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` for an invalid configuration; see
    /// [`MaintenanceGate::new`].
    pub fn new(config: &MaintenanceConfig, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::from_gate(MaintenanceGate::new(config, name)?))
    }

    /// Wrap an already built gate.
    pub fn from_gate(gate: MaintenanceGate) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for MaintenanceLayer {
    type Service = MaintenanceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MaintenanceService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Maintenance service wrapper.
#[derive(Clone)]
pub struct MaintenanceService<S> {
    inner: S,
    gate: MaintenanceGate,
}

impl<S> Service<Request<Body>> for MaintenanceService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        let mut inner = self.inner.clone();

        // Everything the gate needs is pulled out up front; the request itself
        // is only moved into the inner service.
        let client_ip = resolve_client_ip(&req).into_owned();
        let timeout = req.effective_timeout(gate.upstream_timeout());

        Box::pin(async move {
            match gate.handle(&client_ip, timeout).await {
                Some(response) => Ok(response),
                None => inner.call(req).await,
            }
        })
    }
}
