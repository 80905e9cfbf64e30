#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod rate_limit;

pub use rate_limit::{RateLimit, SlidingWindowLimiter};
