// BpLogger Domain
// This crate contains the business logic for the blood pressure logger

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the store configuration from the data layer for convenience
pub use bp_logger_data::config;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
