pub mod metrics;
pub mod readings;
pub mod analytics;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use readings::{
    create_default_reading_service, import_merge, EntryOutcome, ImportOutcome, LoadOutcome,
    ReadingService, ReadingServiceError, ReadingServiceTrait, SaveOutcome,
};

// Re-export mock service factory functions when the mock feature is enabled
#[cfg(feature = "mock")]
pub use readings::create_mock_reading_service;
