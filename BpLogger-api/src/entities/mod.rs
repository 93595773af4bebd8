// Public entities for the BpLogger API
// This module contains data structures that are shared across the application boundary

// Request and response bodies for readings
pub mod reading;

// Common entities for error handling and query parameters
pub mod common;
