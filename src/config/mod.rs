/// Database configuration and connection management
pub mod database;

/// Application settings loading from glowlink.toml
pub mod settings;
