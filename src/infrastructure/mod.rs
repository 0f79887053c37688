//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: document store adapters (in-memory, SQLite) and repositories
//! - Config: Application configuration
//! - Telemetry: tracing subscriber setup
//! - State: Shared application state

pub mod clock;
pub mod config;
pub mod persistence;
pub mod state;
pub mod telemetry;
