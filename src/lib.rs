// ABOUTME: Library root for aksdeploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod azure;
pub mod clock;
pub mod config;
pub mod deploy;
pub mod error;
pub mod exec;
pub mod http;
pub mod mocks;
pub mod output;
pub mod tools;
pub mod types;
