//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `cleanup` - Purge expired auth data once
//! - `create-admin` - Bootstrap an administrator account

pub mod args;

pub use args::{Cli, Commands};
