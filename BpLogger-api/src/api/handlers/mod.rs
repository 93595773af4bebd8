pub mod health;
pub mod readings;

// Re-export handlers for easier imports
pub use health::health_check;
pub use readings::{
    clear_readings, create_reading, export_readings, get_categories, get_recent_readings,
    get_scatter, get_trends, get_weekly_summary, import_readings,
};
