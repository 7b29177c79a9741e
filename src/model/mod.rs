pub mod quote;
pub mod quote_stats;
