pub mod callbacks;
pub mod commands;
pub mod messages;
pub mod payments;
pub mod relay;
pub mod utils;

pub use callbacks::callback_handler;
pub use commands::command_handler;
pub use messages::{is_operator_reply, message_handler, operator_reply_handler};
pub use payments::{pre_checkout_handler, successful_payment_handler};
