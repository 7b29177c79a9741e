pub mod email;
pub mod email_templates;
pub mod error;
pub mod logger;
