//! CLI command handlers

pub mod act;
pub mod scrape;
pub mod start;
pub mod status;
