pub mod email_dto;
pub mod quote_dto;
