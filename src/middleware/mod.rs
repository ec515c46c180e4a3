mod error_handler;
mod rate_limit;
mod session;

pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, rate_limit};
pub use session::require_session;
