pub mod payment_config;
pub mod session;

pub use payment_config::PaymentConfig;
pub use session::{FallbackTimer, Session};
