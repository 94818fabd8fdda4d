pub mod analyze;
pub mod ask;
pub mod batch;
pub mod cache;
pub mod classify;
pub mod config;
pub mod models;
pub mod repl;
