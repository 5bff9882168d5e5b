pub mod academy;
pub mod admin;
pub mod config;
pub mod error;
pub mod telemetry;
