//! Per-connection rate limiting for inbound WebSocket frames.
//!
//! A connection gets a burst window and a sustained window; a frame is
//! accepted only if both have room for it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Which window rejected a frame
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LimitKind {
    Burst,
    Sustained,
}

impl LimitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Burst => "burst",
            Self::Sustained => "sustained",
        }
    }

    /// Message sent back to the client in an `error` event
    pub fn message(self) -> &'static str {
        match self {
            Self::Burst => "Rate limit exceeded. Please slow down.",
            Self::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Sliding window over the timestamps of accepted frames
#[derive(Debug)]
pub struct RateLimiter {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use bm_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 10 frames per second
    /// let limiter = RateLimiter::new(10, Duration::from_secs(1));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// 10 frames per second
    pub fn burst() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// 100 frames per minute
    pub fn sustained() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.max_requests
    }

    /// Check if a frame should be allowed, recording it if so
    ///
    /// ```
    /// # use bm_server::api::rate_limiter::RateLimiter;
    /// # use std::time::Duration;
    /// let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
    /// for _ in 0..5 {
    ///     assert!(limiter.check());
    /// }
    /// assert!(!limiter.check());
    /// ```
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if !self.has_room(now) {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    /// Number of frames left in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// The pair of limits applied to one connection
#[derive(Debug)]
pub struct ConnectionLimiter {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl Default for ConnectionLimiter {
    fn default() -> Self {
        Self::new(RateLimiter::burst(), RateLimiter::sustained())
    }
}

impl ConnectionLimiter {
    pub fn new(burst: RateLimiter, sustained: RateLimiter) -> Self {
        Self { burst, sustained }
    }

    /// Admit a frame, or report which window is exhausted. A frame rejected
    /// by one window is not counted against the other.
    pub fn admit(&mut self) -> Result<(), LimitKind> {
        let now = Instant::now();
        if !self.burst.has_room(now) {
            return Err(LimitKind::Burst);
        }
        if !self.sustained.has_room(now) {
            return Err(LimitKind::Sustained);
        }
        self.burst.timestamps.push_back(now);
        self.sustained.timestamps.push_back(now);
        Ok(())
    }
}
