pub mod auth;
pub mod permissions;
pub mod rate_limit;
pub mod security_headers;

pub use auth::{require_auth, AuthenticatedUser, Identity};
pub use permissions::*;
pub use rate_limit::{rate_limit, RateLimiter};
pub use security_headers::security_headers;
