pub mod http_client_factory;
pub mod rate_limiter;

pub use http_client_factory::{HttpClientFactory, build_url_with_query};
pub use rate_limiter::RateLimiter;
