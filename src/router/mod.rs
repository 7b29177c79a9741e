pub mod email_router;
pub mod quote_router;
