//! Fixed-window rate limiting keyed by caller and endpoint.

pub mod clock;
pub mod limiter;
pub mod policy;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, MockClock, SystemClock};
pub use limiter::{RateLimitDecision, RateLimiter};
pub use policy::{
    EndpointClass, EndpointPolicies, PolicyError, RateLimitPolicy, DEFAULT_ENDPOINT_LABEL,
    MAX_WINDOW_SECS,
};
pub use store::{InMemoryStore, RateLimitEntry, RateLimitStore};
pub use sweeper::RateLimitSweeper;
