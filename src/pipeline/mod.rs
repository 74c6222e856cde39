// =============================================================================
// Pipeline Driver: discovery, per-instrument processing, atomic output
// =============================================================================

pub mod driver;
pub mod report;
pub mod writer;

pub use driver::Pipeline;
pub use report::RunReport;
