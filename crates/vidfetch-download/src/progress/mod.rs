//! Progress rate limiting for job notifications.

mod throttle;

pub use throttle::ProgressThrottle;
