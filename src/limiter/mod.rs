//! Per-client sliding window rate limiting.
//!
//! Each client gets a queue of request instants. Instants older than
//! the window are pruned on every check. A client that reaches the
//! quota is blocked for a fixed cooldown that does not depend on the
//! window length. State lives in memory only and resets when the
//! process restarts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Longest cooldown a limiter will apply. Larger values would
/// overflow `Instant` arithmetic.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(60 * 60 * 24 * 365);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of the sliding window
    pub window: Duration,
    /// Requests allowed per client within `window`
    pub max_requests: usize,
    /// How long a client is blocked after reaching `max_requests`
    pub cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 20,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }

    /// Whole seconds until the client may retry, rounded up so a
    /// blocked client is never told to retry in 0 seconds.
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateLimitDecision::Allowed => 0,
            RateLimitDecision::Limited { retry_after } => {
                let secs = retry_after.as_secs();
                if retry_after.subsec_nanos() > 0 {
                    secs + 1
                } else {
                    secs
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct ClientWindow {
    requests: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

impl ClientWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        // Requests are appended in order so the oldest is always first
        while let Some(oldest) = self.requests.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    fn blocked_for(&self, now: Instant) -> Option<Duration> {
        self.blocked_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    fn is_stale(&self, now: Instant) -> bool {
        self.requests.is_empty() && self.blocked_for(now).is_none()
    }
}

/// Cheap to clone, all clones share the same client state.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<Mutex<HashMap<String, ClientWindow>>>,
}

impl RateLimiter {
    pub fn new(mut config: RateLimitConfig) -> Self {
        if config.cooldown > MAX_COOLDOWN {
            tracing::warn!(
                cooldown_secs = config.cooldown.as_secs(),
                "Rate limit cooldown capped at {} seconds",
                MAX_COOLDOWN.as_secs()
            );
            config.cooldown = MAX_COOLDOWN;
        }
        Self {
            config,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether `client_id` may make a request right now and
    /// record it if so.
    pub fn check(&self, client_id: &str) -> RateLimitDecision {
        self.check_at(client_id, Instant::now())
    }

    pub fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        let RateLimitConfig {
            window,
            max_requests,
            cooldown,
        } = self.config;
        let mut clients = self.lock();
        let client = clients.entry(client_id.to_string()).or_default();

        client.prune(now, window);

        if let Some(retry_after) = client.blocked_for(now) {
            return RateLimitDecision::Limited { retry_after };
        }

        if client.requests.len() >= max_requests {
            client.blocked_until = Some(now + cooldown);
            tracing::warn!(
                client_id = %client_id,
                requests = client.requests.len(),
                cooldown_secs = cooldown.as_secs(),
                "Client exceeded rate limit"
            );
            return RateLimitDecision::Limited {
                retry_after: cooldown,
            };
        }

        client.requests.push_back(now);
        RateLimitDecision::Allowed
    }

    /// Drop clients with nothing left in their window that are not
    /// blocked. Returns the number of clients removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, client| {
            client.prune(now, window);
            !client.is_stale(now)
        });
        before - clients.len()
    }

    /// Number of clients currently tracked
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClientWindow>> {
        // The map is left consistent after every mutation so a
        // poisoned lock can still be used
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
