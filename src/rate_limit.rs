//! Per-client token buckets.
//!
//! Two limits apply, both keyed on the peer IP address:
//!
//! - every route shares a default quota of requests per minute and per second,
//!   enforced by [`limit_requests`] as router middleware;
//! - profile writes additionally draw from a smaller [`WriteLimiter`] quota.
//!
//! Requests without connection info (in-process tests) share the
//! unspecified address as their key.

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::Extensions;
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::error::Error;
use crate::server::AppState;

type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

fn keyed(count: u32, quota: fn(NonZeroU32) -> Quota) -> Option<ClientLimiter> {
    NonZeroU32::new(count).map(|n| RateLimiter::keyed(quota(n)))
}

/// Take one token for `client`, returning how long to wait on rejection.
fn take(limiter: &Option<ClientLimiter>, client: &IpAddr) -> Result<(), Duration> {
    let Some(limiter) = limiter else {
        return Ok(());
    };
    limiter
        .check_key(client)
        .map_err(|not_until| not_until.wait_time_from(limiter.clock().now()))
}

fn rate_limited(wait: Duration) -> Error {
    // Round up to whole seconds.
    let retry_after_secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    Error::RateLimited { retry_after_secs }
}

/// Peer address of the request, or the unspecified address when unknown.
fn client_ip(extensions: &Extensions) -> IpAddr {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Extractor yielding the client key used for rate limiting.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.extensions)))
    }
}

/// Profile write quota, per client. `None` inside means unlimited.
pub struct WriteLimiter {
    limiter: Option<ClientLimiter>,
}

impl WriteLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            limiter: keyed(cfg.writes_per_minute, Quota::per_minute),
        }
    }

    /// Take one write token for `client`, or fail with [`Error::RateLimited`].
    pub fn check(&self, client: IpAddr) -> Result<(), Error> {
        take(&self.limiter, &client).map_err(|wait| {
            tracing::warn!(%client, "Rate limit exceeded for profile write");
            rate_limited(wait)
        })
    }

    pub fn retain_recent(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
        }
    }
}

/// Default quota shared by every route, per client.
pub struct RequestLimiter {
    per_minute: Option<ClientLimiter>,
    per_second: Option<ClientLimiter>,
}

impl RequestLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            per_minute: keyed(cfg.requests_per_minute, Quota::per_minute),
            per_second: keyed(cfg.requests_per_second, Quota::per_second),
        }
    }

    pub fn check(&self, client: IpAddr) -> Result<(), Error> {
        take(&self.per_second, &client)
            .and_then(|()| take(&self.per_minute, &client))
            .map_err(|wait| {
                tracing::warn!(%client, "Rate limit exceeded");
                rate_limited(wait)
            })
    }

    /// Drop buckets of clients that have been idle long enough to be full again.
    pub fn retain_recent(&self) {
        for limiter in [&self.per_minute, &self.per_second].into_iter().flatten() {
            limiter.retain_recent();
        }
    }
}

/// Router middleware applying the default request quota.
pub async fn limit_requests(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    state.requests().check(client)?;
    Ok(next.run(req).await)
}
