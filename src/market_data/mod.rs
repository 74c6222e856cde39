pub mod bar;
pub mod loader;

// Re-export what the driver needs (e.g. `use crate::market_data::PriceSeries`).
pub use bar::PriceSeries;
pub use loader::{load_series, LoadReport};
