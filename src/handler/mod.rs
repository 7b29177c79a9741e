pub mod email_handler;
pub mod quote_handler;
