// Storage models
pub mod reading;

pub use reading::{ReadingRow, ReadingTable, COLUMNS};
