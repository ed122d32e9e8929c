pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod exit;
pub mod graph;
pub mod lang;
pub mod project;
pub mod report;
pub mod reporting;
pub mod security;
pub mod types;
