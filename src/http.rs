//! HTTP client with rate limiting for the speaker's embedded web server.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * Request rate limiting so that polling and control actions cannot flood
//!   the speaker
//! * A mandatory per-request timeout
//! * Consistent keepalive and `User-Agent` settings
//!
//! # Example
//!
//! ```rust
//! use jbl4305p::http::Client;
//!
//! let client = Client::new(&config)?;
//! let request = client.get(url);
//! let response = client.execute(request).await?;
//! ```

use std::{future::Future, num::NonZeroU32, time::Duration};

use futures_util::FutureExt;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{self, Method, Url};

use crate::{config::Config, error::Result};

/// HTTP client with built-in rate limiting.
///
/// Cheap to share behind an `Arc`: the underlying connection pool is reused
/// by every request.
pub struct Client {
    /// Unlimited request client for special cases.
    pub unlimited: reqwest::Client,

    /// Rate limiter protecting the speaker.
    rate_limiter: DefaultDirectRateLimiter,
}

impl Client {
    /// Maximum requests per second sent to a single speaker.
    ///
    /// One poll issues a handful of requests; input discovery issues about
    /// ten. This leaves plenty of room for both while keeping a runaway
    /// caller from hammering the device.
    const RATE_LIMIT_PER_SECOND: u32 = 20;

    /// Duration to keep idle connections alive.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Upper bound for a full request, connect through body.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    ///
    /// # Panics
    ///
    /// Panics if the rate limit is zero.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(&config.user_agent);

        let quota = Quota::per_second(
            NonZeroU32::new(Self::RATE_LIMIT_PER_SECOND).expect("rate limit is zero"),
        );

        Ok(Self {
            unlimited: http_client.build()?,
            rate_limiter: governor::RateLimiter::direct(quota),
        })
    }

    /// Builds a GET request.
    ///
    /// The speaker's API takes everything, including writes, as query
    /// parameters on GET requests.
    pub fn get<U>(&self, url: U) -> reqwest::Request
    where
        U: Into<Url>,
    {
        reqwest::Request::new(Method::GET, url.into())
    }

    /// Executes a request with rate limiting.
    ///
    /// Returns the raw `reqwest` result so that callers can decide how a
    /// failure should be classified.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = std::result::Result<reqwest::Response, reqwest::Error>> + '_ {
        // No need to await with jitter because the level of concurrency is low.
        let throttle = self.rate_limiter.until_ready();
        throttle.then(|()| self.unlimited.execute(request))
    }
}
