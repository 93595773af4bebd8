// BpLogger Data
// This crate handles persistence of the reading table and the external
// services it is stored in.

// Store configuration
pub mod config;

// Delimited-text and grid encoding of the reading table
pub mod codec;

// Repository implementations for the reading table
pub mod repository;

// Data storage models
pub mod models;
