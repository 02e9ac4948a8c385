use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Idle keys are swept from the limiter once every this many checks.
const RETAIN_EVERY: u64 = 1024;

/// Create a keyed rate limiter allowing `attempts` requests per `window_seconds`
/// for each client IP.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let burst = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_millis(window_seconds.saturating_mul(1000) / u64::from(burst.get()));
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);

    Arc::new(RateLimiter::dashmap(quota))
}

/// Where the client address used as the limiter key is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientIpSource {
    /// The TCP peer address from `ConnectInfo`.
    #[default]
    PeerAddress,
    /// The last `X-Forwarded-For` entry, as appended by a trusted reverse
    /// proxy. Falls back to the peer address when the header is absent.
    ForwardedFor,
}

impl ClientIpSource {
    pub fn client_ip(self, request: &Request) -> Option<IpAddr> {
        let peer = || {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        };

        match self {
            ClientIpSource::PeerAddress => peer(),
            ClientIpSource::ForwardedFor => request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.rsplit(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
                .or_else(peer),
        }
    }
}

/// Middleware state: a keyed limiter and how to find the client's address.
#[derive(Clone)]
pub struct IpRateLimit {
    limiter: IpRateLimiter,
    source: ClientIpSource,
    checks: Arc<AtomicU64>,
}

impl IpRateLimit {
    pub fn new(attempts: u32, window_seconds: u64, source: ClientIpSource) -> Self {
        Self {
            limiter: create_ip_rate_limiter(attempts, window_seconds),
            source,
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of client addresses currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    fn sweep_idle_keys(&self) {
        if self.checks.fetch_add(1, Ordering::Relaxed) % RETAIN_EVERY == RETAIN_EVERY - 1 {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
        }
    }
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(rate_limit): State<IpRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = rate_limit.source.client_ip(&request) else {
        tracing::warn!("Could not determine IP for rate limiting");
        return Ok(next.run(request).await);
    };

    rate_limit.sweep_idle_keys();

    match rate_limit.limiter.check_key(&ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(negative) => {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            tracing::warn!(client_ip = %ip, "Rate limit exceeded");
            Err(AppError::TooManyRequests(
                "Too many requests from this IP. Please try again later.".to_string(),
                Some(wait_time.as_secs()),
            ))
        }
    }
}
