pub mod quote_query;
pub mod quote_repo;
pub mod repository_error;
